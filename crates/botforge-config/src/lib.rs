// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Botforge platform.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    BotforgeConfig, CacheConfig, ContextConfig, GatewayConfig, GeminiConfig, ManagerConfig,
    PipelineConfig, RateLimitConfig, ServiceConfig, StorageConfig,
};
pub use validation::{ConfigError, render_errors};

/// Load configuration from the XDG hierarchy and validate it.
///
/// The high-level entry point: loads config from TOML files + env vars via
/// Figment, then runs post-deserialization validation. Returns either a valid
/// `BotforgeConfig` or the list of collected errors.
pub fn load_and_validate() -> Result<BotforgeConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Load(err.to_string())]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<BotforgeConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Load(err.to_string())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_validate_str_happy_path() {
        let config = load_and_validate_str(
            r#"
            [service]
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.service.log_level, "debug");
    }

    #[test]
    fn load_and_validate_str_reports_semantic_errors() {
        let errors = load_and_validate_str(
            r#"
            [rate_limit]
            limit = 0
            "#,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
