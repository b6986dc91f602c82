// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all errors rather than failing fast.

use thiserror::Error;

use crate::model::BotforgeConfig;

/// A single configuration problem found during validation or loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment failed to parse or merge the config sources.
    #[error("config load error: {0}")]
    Load(String),

    /// A semantic constraint on a loaded value failed.
    #[error("invalid config: {message}")]
    Validation { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors.
pub fn validate_config(config: &BotforgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.pipeline.worker_count == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.worker_count must be at least 1".to_string(),
        });
    }

    if config.pipeline.queue_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.queue_capacity must be at least 1".to_string(),
        });
    }

    if config.pipeline.generation_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "pipeline.generation_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.rate_limit.limit == 0 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.limit must be at least 1".to_string(),
        });
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.window_secs must be at least 1".to_string(),
        });
    }

    if config.context.history_turns == 0 {
        errors.push(ConfigError::Validation {
            message: "context.history_turns must be at least 1".to_string(),
        });
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let host = config.gateway.host.trim();
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "gateway.bearer_token must not be blank when set".to_string(),
        });
    }

    if let Some(token) = &config.gateway.webhook_verify_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "gateway.webhook_verify_token must not be blank when set".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Print collected configuration errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for err in errors {
        eprintln!("botforge: {err}");
    }
}
