// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider trait for AI generation services.

use async_trait::async_trait;

use crate::error::BotforgeError;
use crate::types::LanguageCode;

/// External AI generation service.
///
/// One call per task attempt; the pipeline wraps calls in its own timeout
/// and maps elapsed timers to [`BotforgeError::Timeout`], so implementations
/// only need to distinguish transient upstream failures (5xx, 429) from
/// terminal ones.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generates a reply for an assembled prompt in the user's language.
    async fn generate(
        &self,
        prompt: &str,
        language: LanguageCode,
    ) -> Result<String, BotforgeError>;
}
