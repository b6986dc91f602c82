// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The response pipeline: a bounded task queue drained by a fixed pool
//! of generation workers.
//!
//! Enqueue applies memoization (identical message, cached reply goes out
//! without an AI call); workers run the provider under a per-attempt
//! timeout, retry transient failures with exponential backoff, and hand
//! the final reply (or the language-specific fallback) to the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use botforge_cache::MemoryCache;
use botforge_cache::keys::{rate_key, response_key};
use botforge_config::{CacheConfig, PipelineConfig, RateLimitConfig};
use botforge_core::error::BotforgeError;
use botforge_core::traits::{AiProvider, StorageAdapter};
use botforge_core::types::{Platform, TaskRecord, TaskStatus};
use botforge_dispatch::Dispatcher;
use botforge_provider::fallback_reply;
use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::retry::RetryPolicy;
use crate::task::{EnqueueOutcome, EnqueueRequest, GenerationTask};

/// Front end of the pipeline: rate limiting, memoization, task intake.
pub struct ResponsePipeline {
    cache: Arc<MemoryCache>,
    storage: Arc<dyn StorageAdapter>,
    dispatcher: Arc<Dispatcher>,
    tx: mpsc::Sender<GenerationTask>,
    rate_limit: u64,
    rate_window: Duration,
}

impl ResponsePipeline {
    /// Builds the pipeline and spawns its worker pool. Workers run until
    /// `cancel` fires or the intake channel closes; the returned handles
    /// let the caller join them on shutdown.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn AiProvider>,
        cache: Arc<MemoryCache>,
        dispatcher: Arc<Dispatcher>,
        pipeline_config: &PipelineConfig,
        rate_config: &RateLimitConfig,
        cache_config: &CacheConfig,
        cancel: CancellationToken,
    ) -> (Arc<Self>, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(pipeline_config.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let worker = Arc::new(Worker {
            storage: storage.clone(),
            provider,
            cache: cache.clone(),
            dispatcher: dispatcher.clone(),
            retry: RetryPolicy::from_config(pipeline_config),
            generation_timeout: Duration::from_secs(pipeline_config.generation_timeout_secs),
            response_ttl: Duration::from_secs(cache_config.response_ttl_secs),
        });

        let handles = (0..pipeline_config.worker_count.max(1))
            .map(|worker_id| {
                let worker = worker.clone();
                let rx = rx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    worker.run(worker_id, rx, cancel).await;
                })
            })
            .collect();

        let pipeline = Arc::new(Self {
            cache,
            storage,
            dispatcher,
            tx,
            rate_limit: rate_config.limit,
            rate_window: Duration::from_secs(rate_config.window_secs),
        });
        (pipeline, handles)
    }

    /// Bumps the user's fixed-window counter and reports whether this
    /// message pushed them over the limit.
    pub fn over_rate_limit(&self, platform: Platform, external_user_id: &str) -> bool {
        let count = self
            .cache
            .incr(&rate_key(platform, external_user_id), self.rate_window);
        count > self.rate_limit
    }

    /// Accepts a generation request. A cached reply for the identical
    /// message is delivered immediately without touching the provider;
    /// otherwise a task record is created and the job queued.
    pub async fn enqueue(&self, req: EnqueueRequest) -> Result<EnqueueOutcome, BotforgeError> {
        if let Some(reply) = self.cache.get(&response_key(req.bot.id, &req.message)) {
            debug!(bot_id = req.bot.id, "serving memoized reply");
            if let Err(e) = self
                .dispatcher
                .deliver(
                    req.adapter.as_ref(),
                    &req.bot,
                    &req.external_user_id,
                    &reply,
                    req.turn_id,
                    &req.message,
                )
                .await
            {
                warn!(bot_id = req.bot.id, error = %e, "memoized delivery failed");
            }
            return Ok(EnqueueOutcome::Memoized { reply });
        }

        let task_id = Uuid::new_v4().to_string();
        let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        self.storage
            .create_task(&TaskRecord {
                id: task_id.clone(),
                bot_id: req.bot.id,
                attempts: 0,
                status: TaskStatus::Queued,
                created_at: now.clone(),
                updated_at: now,
            })
            .await?;

        let task = GenerationTask {
            task_id: task_id.clone(),
            bot: req.bot,
            adapter: req.adapter,
            turn_id: req.turn_id,
            external_user_id: req.external_user_id,
            message: req.message,
            prompt: req.prompt,
            language: req.language,
        };
        self.tx
            .send(task)
            .await
            .map_err(|_| BotforgeError::Internal("generation queue closed".to_string()))?;
        Ok(EnqueueOutcome::Queued { task_id })
    }
}

/// Shared state of one generation worker.
struct Worker {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn AiProvider>,
    cache: Arc<MemoryCache>,
    dispatcher: Arc<Dispatcher>,
    retry: RetryPolicy,
    generation_timeout: Duration,
    response_ttl: Duration,
}

impl Worker {
    async fn run(
        &self,
        worker_id: usize,
        rx: Arc<Mutex<mpsc::Receiver<GenerationTask>>>,
        cancel: CancellationToken,
    ) {
        debug!(worker_id, "generation worker started");
        loop {
            let task = {
                let mut rx = rx.lock().await;
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    task = rx.recv() => match task {
                        Some(task) => task,
                        None => break,
                    },
                }
            };
            self.process(task).await;
        }
        debug!(worker_id, "generation worker stopped");
    }

    async fn process(&self, task: GenerationTask) {
        let mut attempt: u32 = 0;
        loop {
            self.mark(&task.task_id, TaskStatus::Running, attempt + 1).await;

            let result = match tokio::time::timeout(
                self.generation_timeout,
                self.provider.generate(&task.prompt, task.language),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(BotforgeError::Timeout {
                    duration: self.generation_timeout,
                }),
            };

            match result {
                Ok(reply) => {
                    self.cache.set(
                        &response_key(task.bot.id, &task.message),
                        &reply,
                        Some(self.response_ttl),
                    );
                    self.mark(&task.task_id, TaskStatus::Succeeded, attempt + 1).await;
                    self.deliver(&task, &reply).await;
                    return;
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    warn!(
                        task_id = %task.task_id,
                        attempt,
                        error = %e,
                        "generation attempt failed, backing off"
                    );
                    self.mark(&task.task_id, TaskStatus::FailedRetryable, attempt + 1)
                        .await;
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => {
                    info!(
                        task_id = %task.task_id,
                        bot_id = task.bot.id,
                        attempts = attempt + 1,
                        error = %e,
                        "generation failed, sending fallback"
                    );
                    self.mark(&task.task_id, TaskStatus::FailedTerminal, attempt + 1)
                        .await;
                    self.deliver(&task, fallback_reply(task.language)).await;
                    return;
                }
            }
        }
    }

    /// Task bookkeeping is best-effort; a storage hiccup must not stall
    /// the reply.
    async fn mark(&self, task_id: &str, status: TaskStatus, attempts: u32) {
        if let Err(e) = self.storage.update_task(task_id, status, attempts).await {
            warn!(task_id, error = %e, "task status update failed");
        }
    }

    async fn deliver(&self, task: &GenerationTask, reply: &str) {
        if let Err(e) = self
            .dispatcher
            .deliver(
                task.adapter.as_ref(),
                &task.bot,
                &task.external_user_id,
                reply,
                task.turn_id,
                &task.message,
            )
            .await
        {
            warn!(task_id = %task.task_id, error = %e, "delivery failed");
        }
    }
}
