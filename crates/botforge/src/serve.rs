// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `botforge serve` command implementation.
//!
//! Wires the full platform together: SQLite storage, in-memory cache,
//! Gemini provider, delivery dispatcher, response pipeline, context
//! assembler, bot lifecycle manager, and the monitoring gateway.
//! Supports graceful shutdown via signal handlers.

use std::sync::Arc;
use std::time::Duration;

use botforge_cache::MemoryCache;
use botforge_config::BotforgeConfig;
use botforge_context::ContextAssembler;
use botforge_core::error::BotforgeError;
use botforge_core::traits::{AiProvider, StorageAdapter};
use botforge_dispatch::Dispatcher;
use botforge_gateway::{AuthConfig, GatewayState};
use botforge_manager::{BotManager, BotRegistry};
use botforge_pipeline::ResponsePipeline;
use botforge_provider::GeminiProvider;
use botforge_storage::SqliteStorage;
use tracing::info;

use crate::shutdown;

/// Runs the `botforge serve` command.
pub async fn run_serve(config: BotforgeConfig) -> Result<(), BotforgeError> {
    init_tracing(&config.service.log_level);
    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        "starting botforge"
    );

    let storage: Arc<dyn StorageAdapter> = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    info!(path = %config.storage.database_path, "storage initialized");

    let cache = Arc::new(MemoryCache::new());
    let provider: Arc<dyn AiProvider> = Arc::new(GeminiProvider::new(&config.gemini)?);
    info!(model = %config.gemini.model, "ai provider initialized");

    let dispatcher = Arc::new(Dispatcher::new(storage.clone()));
    let cancel = shutdown::install_signal_handler();

    let (pipeline, pipeline_handles) = ResponsePipeline::start(
        storage.clone(),
        provider,
        cache.clone(),
        dispatcher,
        &config.pipeline,
        &config.rate_limit,
        &config.cache,
        cancel.clone(),
    );
    info!(
        workers = config.pipeline.worker_count,
        queue = config.pipeline.queue_capacity,
        "response pipeline started"
    );

    let assembler = Arc::new(ContextAssembler::new(
        storage.clone(),
        cache.clone(),
        &config.context,
        Duration::from_secs(config.cache.kb_ttl_secs),
    ));

    let manager = Arc::new(BotManager::new(
        storage.clone(),
        cache,
        assembler,
        pipeline,
        Arc::new(BotRegistry::new()),
        &config.manager,
        &config.cache,
        cancel.clone(),
    ));

    // Bot startup runs in the background so the gateway answers health
    // checks while workers are still coming up.
    {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager.start_all_active().await;
        });
    }

    let state = GatewayState {
        manager: manager.clone(),
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        webhook_verify_token: config.gateway.webhook_verify_token.clone(),
    };
    botforge_gateway::start_server(&config.gateway, state, cancel.clone()).await?;

    info!("gateway stopped, draining pipeline workers");
    for handle in pipeline_handles {
        let _ = handle.await;
    }

    storage.close().await?;
    info!("botforge serve shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("botforge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
