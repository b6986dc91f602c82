// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Botforge platform.

use thiserror::Error;

/// The primary error type used across all Botforge components.
///
/// The retry policy in the response pipeline keys off the variant: only
/// [`Transient`](BotforgeError::Transient) and
/// [`Timeout`](BotforgeError::Timeout) are ever retried.
#[derive(Debug, Error)]
pub enum BotforgeError {
    /// Configuration errors (invalid TOML, missing credential, bad token format).
    /// A bot with a configuration error fails to start; other bots are unaffected.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Non-transient platform API errors (4xx, malformed payload, auth rejection).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transient failures against a platform or the AI service (5xx, connect
    /// errors, rate-limit responses from the remote). Retried per policy.
    #[error("transient error: {message}")]
    Transient {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// AI provider errors that are not worth retrying (malformed request,
    /// invalid model, empty candidate list).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Per-user fixed-window rate limit exceeded. No task is enqueued.
    #[error("rate limit exceeded for {user}")]
    RateLimited { user: String },

    /// The owning tenant's subscription has lapsed. No AI call is made.
    #[error("entitlement expired for owner {owner_id}")]
    EntitlementExpired { owner_id: i64 },

    /// Operation timed out. Treated as transient by the retry policy.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A referenced bot or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BotforgeError {
    /// Whether the retry policy may re-attempt an operation that failed
    /// with this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BotforgeError::Transient { .. } | BotforgeError::Timeout { .. }
        )
    }
}
