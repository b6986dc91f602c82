// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./botforge.toml` > `~/.config/botforge/botforge.toml`
//! > `/etc/botforge/botforge.toml` with environment variable overrides via the
//! `BOTFORGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BotforgeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/botforge/botforge.toml` (system-wide)
/// 3. `~/.config/botforge/botforge.toml` (user XDG config)
/// 4. `./botforge.toml` (local directory)
/// 5. `BOTFORGE_*` environment variables
pub fn load_config() -> Result<BotforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BotforgeConfig::default()))
        .merge(Toml::file("/etc/botforge/botforge.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("botforge/botforge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("botforge.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<BotforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BotforgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BotforgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BotforgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `BOTFORGE_GEMINI_API_KEY` must map to
/// `gemini.api_key`, not `gemini.api.key`.
fn env_provider() -> Env {
    Env::prefixed("BOTFORGE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("pipeline_", "pipeline.", 1)
            .replacen("rate_limit_", "rate_limit.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("context_", "context.", 1)
            .replacen("manager_", "manager.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
