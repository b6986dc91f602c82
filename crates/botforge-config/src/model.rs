// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Botforge platform.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Botforge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotforgeConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite storage backend.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gemini generation service.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Response pipeline: worker pool, retries, queue.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Per-user fixed-window rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Cache TTLs.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Prompt context assembly.
    #[serde(default)]
    pub context: ContextConfig,

    /// Bot lifecycle manager supervision.
    #[serde(default)]
    pub manager: ManagerConfig,

    /// Monitoring/admin HTTP gateway.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs and status payloads.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "botforge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("botforge").join("botforge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("botforge.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Gemini API key. `None` requires the environment variable override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for generation requests.
    #[serde(default = "default_model")]
    pub model: String,

    /// Hard cap on reply length in characters, applied after generation.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_reply_chars: default_max_reply_chars(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_reply_chars() -> usize {
    4000
}

/// Response pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Number of concurrent generation workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in seconds; doubled per attempt.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    /// Bound on the in-flight task queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Timeout for one generation attempt in seconds.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            queue_capacity: default_queue_capacity(),
            generation_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    60
}

fn default_queue_capacity() -> usize {
    256
}

fn default_generation_timeout_secs() -> u64 {
    30
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Requests allowed per window per user.
    #[serde(default = "default_rate_limit")]
    pub limit: u64,

    /// Window length in seconds.
    #[serde(default = "default_rate_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_rate_limit(),
            window_secs: default_rate_window_secs(),
        }
    }
}

fn default_rate_limit() -> u64 {
    5
}

fn default_rate_window_secs() -> u64 {
    60
}

/// Cache TTL configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Knowledge-base snapshot TTL in seconds.
    #[serde(default = "default_kb_ttl_secs")]
    pub kb_ttl_secs: u64,

    /// Per-user context TTL in seconds.
    #[serde(default = "default_user_ttl_secs")]
    pub user_ttl_secs: u64,

    /// Memoized AI response TTL in seconds.
    #[serde(default = "default_response_ttl_secs")]
    pub response_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kb_ttl_secs: default_kb_ttl_secs(),
            user_ttl_secs: default_user_ttl_secs(),
            response_ttl_secs: default_response_ttl_secs(),
        }
    }
}

fn default_kb_ttl_secs() -> u64 {
    1800
}

fn default_user_ttl_secs() -> u64 {
    300
}

fn default_response_ttl_secs() -> u64 {
    3600
}

/// Prompt context assembly configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Maximum knowledge snapshot size in characters after truncation.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Recent conversation turns included as short-term memory.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
            history_turns: default_history_turns(),
        }
    }
}

fn default_max_context_chars() -> usize {
    2000
}

fn default_history_turns() -> usize {
    3
}

/// Bot lifecycle supervision configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    /// Worker restart attempts before a bot is parked in the error state.
    #[serde(default = "default_restart_max_attempts")]
    pub restart_max_attempts: u32,

    /// Base restart backoff in seconds; doubled per attempt.
    #[serde(default = "default_restart_backoff_secs")]
    pub restart_backoff_secs: u64,

    /// Delay between bot starts during bulk startup, in milliseconds.
    #[serde(default = "default_startup_stagger_ms")]
    pub startup_stagger_ms: u64,

    /// Long-poll wait handed to platform adapters, in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            restart_max_attempts: default_restart_max_attempts(),
            restart_backoff_secs: default_restart_backoff_secs(),
            startup_stagger_ms: default_startup_stagger_ms(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

fn default_restart_max_attempts() -> u32 {
    3
}

fn default_restart_backoff_secs() -> u64 {
    5
}

fn default_startup_stagger_ms() -> u64 {
    500
}

fn default_poll_timeout_secs() -> u64 {
    25
}

/// Monitoring/admin gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token for the admin endpoints. `None` disables auth (local use).
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Expected `hub.verify_token` for the Graph API webhook handshake.
    /// `None` rejects verification attempts.
    #[serde(default)]
    pub webhook_verify_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
            webhook_verify_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8090
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BotforgeConfig::default();
        assert_eq!(config.service.name, "botforge");
        assert_eq!(config.pipeline.max_retries, 3);
        assert_eq!(config.pipeline.backoff_base_secs, 60);
        assert_eq!(config.rate_limit.limit, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.cache.kb_ttl_secs, 1800);
        assert_eq!(config.context.max_context_chars, 2000);
        assert_eq!(config.context.history_turns, 3);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
    }

    #[test]
    fn config_round_trips_through_serde() {
        // figment's Serialized provider relies on the same serde derive;
        // round-trip to verify the derive is total in both directions.
        let config = BotforgeConfig::default();
        let json = serde_json::to_string(&config).expect("config must serialize");
        let parsed: BotforgeConfig = serde_json::from_str(&json).expect("must deserialize");
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.manager.poll_timeout_secs, 25);
    }
}
