// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP error classification for platform adapters.
//!
//! Every adapter funnels non-success responses through [`map_status`] so the
//! pipeline's retry policy sees one uniform taxonomy: 5xx and 429 are
//! transient, other 4xx are terminal platform errors.

use botforge_core::BotforgeError;

/// Classify a non-success platform API response.
pub fn map_status(platform: &str, status: reqwest::StatusCode, body: &str) -> BotforgeError {
    let message = format!("{platform} API returned {status}: {body}");
    if status.as_u16() == 429 || status.is_server_error() {
        BotforgeError::Transient {
            message,
            source: None,
        }
    } else {
        BotforgeError::Platform {
            message,
            source: None,
        }
    }
}

/// Classify a reqwest transport error. Timeouts and connection failures
/// are transient; anything else is a platform error.
pub fn map_request_error(platform: &str, e: reqwest::Error) -> BotforgeError {
    let message = format!("{platform} request failed: {e}");
    if e.is_timeout() || e.is_connect() {
        BotforgeError::Transient {
            message,
            source: Some(Box::new(e)),
        }
    } else {
        BotforgeError::Platform {
            message,
            source: Some(Box::new(e)),
        }
    }
}
