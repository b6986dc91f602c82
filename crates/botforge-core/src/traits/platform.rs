// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform adapter trait for messaging platform integrations
//! (Telegram, WhatsApp Cloud, Instagram Messaging).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BotforgeError;
use crate::types::{AttachmentRef, ChannelCapabilities, NormalizedMessage, Platform};

/// Adapter over one bot's credential on one messaging platform.
///
/// Adapters normalize inbound updates into [`NormalizedMessage`] and
/// translate platform-specific transient failures (HTTP 5xx, timeouts)
/// into [`BotforgeError::Transient`] so the pipeline's retry policy
/// stays platform-agnostic.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// The platform this adapter speaks to.
    fn platform(&self) -> Platform;

    /// Returns the capabilities supported by this platform.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Waits up to `timeout` for the next inbound update.
    ///
    /// Returns `Ok(None)` when the bounded wait elapses without an update;
    /// the polling worker simply loops.
    async fn receive_next(
        &self,
        timeout: Duration,
    ) -> Result<Option<NormalizedMessage>, BotforgeError>;

    /// Sends a text reply to the given platform-native target.
    async fn send(&self, target: &str, text: &str) -> Result<(), BotforgeError>;

    /// Sends a media attachment. Platforms without media support reject
    /// the call; callers should consult [`capabilities`](Self::capabilities).
    async fn send_media(
        &self,
        _target: &str,
        _attachment: &AttachmentRef,
    ) -> Result<(), BotforgeError> {
        Err(BotforgeError::Platform {
            message: format!("{} adapter does not support media", self.platform()),
            source: None,
        })
    }
}
