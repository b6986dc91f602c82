// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bot lifecycle manager.
//!
//! Owns one polling worker per active bot. Each worker long-polls its
//! platform adapter, gates messages on the tenant's entitlement and the
//! per-user rate limit, records the turn, assembles the prompt, and
//! hands generation to the response pipeline. Workers are supervised
//! with a bounded restart budget; exhausting it parks the bot in the
//! error state and persists it inactive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use botforge_cache::MemoryCache;
use botforge_cache::keys::user_ctx_key;
use botforge_config::{CacheConfig, ManagerConfig};
use botforge_context::ContextAssembler;
use botforge_core::error::BotforgeError;
use botforge_core::traits::{PlatformAdapter, StorageAdapter};
use botforge_core::types::{Bot, BotState, LanguageCode, NewTurn, NormalizedMessage};
use botforge_pipeline::{EnqueueOutcome, EnqueueRequest, ResponsePipeline};
use botforge_platform::AdapterHandle;
use botforge_provider::{expired_reply, fallback_reply, rate_limited_reply};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::registry::{BotRegistry, RegistryEntry, RegistrySnapshot, registry_key};

/// Result of an idempotent start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Builds a platform adapter for a bot. Swappable so tests can run
/// workers against in-memory adapters.
pub type AdapterFactory =
    Arc<dyn Fn(&Bot) -> Result<AdapterHandle, BotforgeError> + Send + Sync>;

/// Cached per-user view: reply language plus whether the owning tenant
/// is currently entitled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct UserContext {
    language: LanguageCode,
    entitled: bool,
}

pub struct BotManager {
    storage: Arc<dyn StorageAdapter>,
    cache: Arc<MemoryCache>,
    assembler: Arc<ContextAssembler>,
    pipeline: Arc<ResponsePipeline>,
    registry: Arc<BotRegistry>,
    adapter_factory: AdapterFactory,
    restart_max_attempts: u32,
    restart_backoff: Duration,
    startup_stagger: Duration,
    poll_timeout: Duration,
    user_ttl: Duration,
    shutdown: CancellationToken,
    startup_complete: AtomicBool,
}

impl BotManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        cache: Arc<MemoryCache>,
        assembler: Arc<ContextAssembler>,
        pipeline: Arc<ResponsePipeline>,
        registry: Arc<BotRegistry>,
        manager_config: &ManagerConfig,
        cache_config: &CacheConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            storage,
            cache,
            assembler,
            pipeline,
            registry,
            adapter_factory: Arc::new(botforge_platform::make_adapter),
            restart_max_attempts: manager_config.restart_max_attempts,
            restart_backoff: Duration::from_secs(manager_config.restart_backoff_secs),
            startup_stagger: Duration::from_millis(manager_config.startup_stagger_ms),
            poll_timeout: Duration::from_secs(manager_config.poll_timeout_secs),
            user_ttl: Duration::from_secs(cache_config.user_ttl_secs),
            shutdown,
            startup_complete: AtomicBool::new(false),
        }
    }

    /// Replaces the adapter factory; the seam tests use to run workers
    /// against in-memory platforms.
    pub fn with_adapter_factory(mut self, factory: AdapterFactory) -> Self {
        self.adapter_factory = factory;
        self
    }

    pub fn registry(&self) -> &Arc<BotRegistry> {
        &self.registry
    }

    /// Starts a worker for a bot. Idempotent: a second start while the
    /// first worker lives reports `AlreadyRunning` and spawns nothing.
    pub async fn start_bot(self: &Arc<Self>, bot_id: i64) -> Result<StartOutcome, BotforgeError> {
        let bot = self
            .storage
            .get_bot(bot_id)
            .await?
            .ok_or_else(|| BotforgeError::NotFound(format!("bot {bot_id}")))?;
        if !bot.active {
            return Err(BotforgeError::Config(format!("bot {bot_id} is not active")));
        }

        let handle = (self.adapter_factory)(&bot)?;
        let key = registry_key(bot.platform, bot.id);
        let cancel = self.shutdown.child_token();
        let worker_id = Uuid::new_v4();
        let installed = self.registry.install(
            &key,
            RegistryEntry {
                bot_id: bot.id,
                name: bot.name.clone(),
                platform: bot.platform,
                state: BotState::Starting,
                started_at: Utc::now(),
                cancel: cancel.clone(),
                worker_id,
                inbox: handle.inbox.clone(),
            },
        );
        if !installed {
            debug!(bot_id, "start requested for already-running bot");
            return Ok(StartOutcome::AlreadyRunning);
        }

        info!(bot_id, key = %key, platform = %bot.platform, "starting bot worker");
        let manager = self.clone();
        let adapter = handle.adapter;
        tokio::spawn(async move {
            run_worker(manager, bot, adapter, key, worker_id, cancel).await;
        });
        Ok(StartOutcome::Started)
    }

    /// Cancels a bot's worker. In-flight generation still completes;
    /// delivery re-checks the active flag on its own.
    pub async fn stop_bot(&self, bot_id: i64) -> Result<(), BotforgeError> {
        let key = self
            .registry
            .find_key(bot_id)
            .ok_or_else(|| BotforgeError::NotFound(format!("bot {bot_id} is not running")))?;
        self.registry.cancel_and_remove(&key);
        info!(bot_id, key = %key, "bot worker stop requested");
        Ok(())
    }

    /// Stop-then-start from a fresh storage read.
    pub async fn restart_bot(self: &Arc<Self>, bot_id: i64) -> Result<Bot, BotforgeError> {
        let bot = self
            .storage
            .get_bot(bot_id)
            .await?
            .ok_or_else(|| BotforgeError::NotFound(format!("bot {bot_id}")))?;
        if !bot.active {
            return Err(BotforgeError::Config(format!("bot {bot_id} is not active")));
        }
        if let Some(key) = self.registry.find_key(bot_id) {
            self.registry.cancel_and_remove(&key);
        }
        self.start_bot(bot_id).await?;
        Ok(bot)
    }

    /// Starts every active bot with a stagger between starts. Partial
    /// failure is logged per bot; startup is marked complete regardless.
    pub async fn start_all_active(self: &Arc<Self>) {
        match self.storage.list_active_bots().await {
            Ok(bots) => {
                info!(count = bots.len(), "starting active bots");
                for bot in bots {
                    if let Err(e) = self.start_bot(bot.id).await {
                        warn!(bot_id = bot.id, error = %e, "bot failed to start");
                    }
                    tokio::time::sleep(self.startup_stagger).await;
                }
            }
            Err(e) => error!(error = %e, "could not list active bots"),
        }
        self.startup_complete.store(true, Ordering::SeqCst);
        info!(active = self.registry.active_count(), "bot startup complete");
    }

    pub fn startup_complete(&self) -> bool {
        self.startup_complete.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> RegistrySnapshot {
        self.registry.snapshot(self.startup_complete())
    }

    /// One long-poll plus message handling. `Err` means the worker
    /// itself is broken (terminal platform error) and should restart.
    async fn poll_cycle(
        &self,
        bot: &Bot,
        adapter: &Arc<dyn PlatformAdapter>,
    ) -> Result<(), BotforgeError> {
        match adapter.receive_next(self.poll_timeout).await {
            Ok(Some(msg)) => {
                self.handle_message(bot, adapter, msg).await;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) if e.is_transient() => {
                warn!(bot_id = bot.id, error = %e, "transient poll error");
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Entitlement gate, rate limit, turn record, prompt assembly,
    /// enqueue. Failures reply to the user where possible and never
    /// propagate out of the worker loop.
    async fn handle_message(
        &self,
        bot: &Bot,
        adapter: &Arc<dyn PlatformAdapter>,
        msg: NormalizedMessage,
    ) {
        let user = msg.external_user_id;
        let ctx = self.user_context(bot, &user).await;

        if !ctx.entitled {
            debug!(bot_id = bot.id, "tenant entitlement lapsed, notifying user");
            if let Err(e) = adapter.send(&user, expired_reply(ctx.language)).await {
                warn!(bot_id = bot.id, error = %e, "expired notice failed");
            }
            return;
        }

        if self.pipeline.over_rate_limit(bot.platform, &user) {
            debug!(bot_id = bot.id, "user over rate limit");
            if let Err(e) = adapter.send(&user, rate_limited_reply(ctx.language)).await {
                warn!(bot_id = bot.id, error = %e, "rate limit notice failed");
            }
            return;
        }

        let turn_id = match self
            .storage
            .save_turn(&NewTurn {
                bot_id: bot.id,
                platform: bot.platform,
                external_user_id: user.clone(),
                message: msg.text.clone(),
                language: ctx.language,
            })
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(bot_id = bot.id, error = %e, "failed to record turn, dropping message");
                return;
            }
        };

        let prompt = match self
            .assembler
            .assemble(bot, &user, &msg.text, ctx.language)
            .await
        {
            Ok(prompt_ctx) => prompt_ctx.render(),
            Err(e) => {
                warn!(bot_id = bot.id, error = %e, "context assembly failed, sending fallback");
                let fallback = fallback_reply(ctx.language);
                if let Err(e) = self.storage.update_turn_response(turn_id, fallback).await {
                    warn!(bot_id = bot.id, error = %e, "fallback persistence failed");
                }
                if let Err(e) = adapter.send(&user, fallback).await {
                    warn!(bot_id = bot.id, error = %e, "fallback send failed");
                }
                return;
            }
        };

        match self
            .pipeline
            .enqueue(EnqueueRequest {
                bot: bot.clone(),
                adapter: adapter.clone(),
                turn_id,
                external_user_id: user,
                message: msg.text,
                prompt,
                language: ctx.language,
            })
            .await
        {
            Ok(EnqueueOutcome::Queued { task_id }) => {
                debug!(bot_id = bot.id, task_id = %task_id, "generation queued");
            }
            Ok(EnqueueOutcome::Memoized { .. }) => {
                debug!(bot_id = bot.id, "memoized reply served");
            }
            Err(e) => warn!(bot_id = bot.id, error = %e, "enqueue failed"),
        }
    }

    /// Language and entitlement snapshot for a user, cached briefly.
    /// A storage error fails open (entitled) but is never cached.
    async fn user_context(&self, bot: &Bot, user: &str) -> UserContext {
        let key = user_ctx_key(bot.id, user);
        if let Some(raw) = self.cache.get(&key) {
            if let Ok(ctx) = serde_json::from_str::<UserContext>(&raw) {
                return ctx;
            }
        }

        let ctx = match self.storage.entitlement(bot.owner_id).await {
            Ok(Some(ent)) => {
                let language = if ent.allows_language(ent.language) {
                    ent.language
                } else {
                    LanguageCode::default()
                };
                UserContext {
                    language,
                    entitled: ent.is_active(),
                }
            }
            Ok(None) => UserContext {
                language: LanguageCode::default(),
                entitled: false,
            },
            Err(e) => {
                warn!(bot_id = bot.id, error = %e, "entitlement read failed, failing open");
                return UserContext {
                    language: LanguageCode::default(),
                    entitled: true,
                };
            }
        };
        if let Ok(raw) = serde_json::to_string(&ctx) {
            self.cache.set(&key, &raw, Some(self.user_ttl));
        }
        ctx
    }
}

/// Supervised worker loop for one bot.
async fn run_worker(
    manager: Arc<BotManager>,
    bot: Bot,
    adapter: Arc<dyn PlatformAdapter>,
    key: String,
    worker_id: Uuid,
    cancel: CancellationToken,
) {
    manager.registry.set_state(&key, worker_id, BotState::Running);
    info!(bot_id = bot.id, platform = %bot.platform, "bot worker running");

    let mut crashes: u32 = 0;
    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = manager.poll_cycle(&bot, &adapter) => result,
        };
        match result {
            Ok(()) => crashes = 0,
            Err(e) => {
                crashes += 1;
                if crashes > manager.restart_max_attempts {
                    error!(
                        bot_id = bot.id,
                        error = %e,
                        "restart budget exhausted, parking bot"
                    );
                    manager.registry.set_state(&key, worker_id, BotState::Error);
                    if let Err(e) = manager.storage.set_bot_active(bot.id, false).await {
                        warn!(bot_id = bot.id, error = %e, "failed to persist inactive flag");
                    }
                    return;
                }
                let backoff = manager
                    .restart_backoff
                    .saturating_mul(2u32.saturating_pow(crashes - 1));
                warn!(
                    bot_id = bot.id,
                    attempt = crashes,
                    backoff_secs = backoff.as_secs(),
                    error = %e,
                    "worker error, restarting"
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }
    }

    manager.registry.set_state(&key, worker_id, BotState::Stopping);
    manager.registry.remove_worker(&key, worker_id);
    info!(bot_id = bot.id, "bot worker stopped");
}
