// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram Bot API adapter.
//!
//! Inbound messages arrive via `getUpdates` long polling with offset
//! tracking; replies go out via `sendMessage`. One adapter instance serves
//! one bot token.

use std::collections::VecDeque;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use botforge_core::{
    BotforgeError, ChannelCapabilities, NormalizedMessage, Platform, PlatformAdapter,
};
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::{map_request_error, map_status};

/// Base URL for the Telegram Bot API.
const API_BASE_URL: &str = "https://api.telegram.org";

/// Grace added to the HTTP request deadline over the long-poll window.
const POLL_GRACE: Duration = Duration::from_secs(5);

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:[A-Za-z0-9_-]+$").expect("valid token pattern"));

/// Returns true when the string looks like a Telegram bot token.
pub fn is_valid_token(token: &str) -> bool {
    TOKEN_RE.is_match(token)
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: i64,
    chat: TgChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

/// Telegram adapter for one bot token.
pub struct TelegramAdapter {
    client: reqwest::Client,
    token: String,
    base_url: String,
    offset: AtomicI64,
    pending: tokio::sync::Mutex<VecDeque<NormalizedMessage>>,
}

impl TelegramAdapter {
    /// Creates an adapter after validating the token shape.
    pub fn new(token: &str) -> Result<Self, BotforgeError> {
        if !is_valid_token(token) {
            return Err(BotforgeError::Config(
                "telegram token does not match expected format".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
            base_url: API_BASE_URL.to_string(),
            offset: AtomicI64::new(0),
            pending: tokio::sync::Mutex::new(VecDeque::new()),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn normalize(message: TgMessage) -> Option<NormalizedMessage> {
        let text = message.text?;
        Some(NormalizedMessage {
            platform: Platform::Telegram,
            external_user_id: message.chat.id.to_string(),
            text,
            attachment: None,
            platform_message_id: message.message_id.to_string(),
            received_at: Utc::now(),
        })
    }
}

#[async_trait]
impl PlatformAdapter for TelegramAdapter {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_media: true,
            supports_typing: true,
            max_message_length: Some(4096),
        }
    }

    async fn receive_next(
        &self,
        timeout: Duration,
    ) -> Result<Option<NormalizedMessage>, BotforgeError> {
        {
            let mut pending = self.pending.lock().await;
            if let Some(message) = pending.pop_front() {
                return Ok(Some(message));
            }
        }

        let offset = self.offset.load(Ordering::Acquire);
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[
                ("timeout", timeout.as_secs().to_string()),
                ("offset", offset.to_string()),
            ])
            .timeout(timeout + POLL_GRACE)
            .send()
            .await
            .map_err(|e| map_request_error("telegram", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status("telegram", status, &body));
        }

        let parsed: ApiResponse<Vec<Update>> =
            response.json().await.map_err(|e| BotforgeError::Platform {
                message: format!("telegram getUpdates parse failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        if !parsed.ok {
            return Err(BotforgeError::Platform {
                message: format!(
                    "telegram getUpdates rejected: {}",
                    parsed.description.unwrap_or_default()
                ),
                source: None,
            });
        }

        let updates = parsed.result.unwrap_or_default();
        if let Some(max_id) = updates.iter().map(|u| u.update_id).max() {
            self.offset.store(max_id + 1, Ordering::Release);
        }

        let mut normalized: VecDeque<NormalizedMessage> = updates
            .into_iter()
            .filter_map(|u| u.message)
            .filter_map(Self::normalize)
            .collect();
        debug!(count = normalized.len(), "telegram updates received");

        let first = normalized.pop_front();
        if !normalized.is_empty() {
            self.pending.lock().await.extend(normalized);
        }
        Ok(first)
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), BotforgeError> {
        let chat_id: serde_json::Value = match target.parse::<i64>() {
            Ok(id) => id.into(),
            Err(_) => target.into(),
        };
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| map_request_error("telegram", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "telegram sendMessage failed");
            return Err(map_status("telegram", status, &body));
        }
        Ok(())
    }
}
