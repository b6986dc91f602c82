// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instagram Messaging adapter.
//!
//! Direct messages go out through the Graph API `me/messages` endpoint.
//! Inbound messages are webhook deliveries drained from the adapter's
//! [`Inbox`], same as WhatsApp.

use std::time::Duration;

use async_trait::async_trait;
use botforge_core::{
    BotforgeError, ChannelCapabilities, NormalizedMessage, Platform, PlatformAdapter,
};
use chrono::Utc;

use crate::http::{map_request_error, map_status};
use crate::inbox::{Inbox, InboxSender};

/// Base URL for the Graph API.
const API_BASE_URL: &str = "https://graph.facebook.com/v18.0";

/// Instagram Messaging adapter for one page access token.
pub struct InstagramAdapter {
    client: reqwest::Client,
    token: String,
    base_url: String,
    inbox: Inbox,
    inbox_sender: InboxSender,
}

impl InstagramAdapter {
    /// Creates an adapter for the given page access token.
    pub fn new(token: &str) -> Result<Self, BotforgeError> {
        if token.is_empty() {
            return Err(BotforgeError::Config(
                "instagram access token cannot be empty".to_string(),
            ));
        }
        let (inbox, inbox_sender) = Inbox::new();
        Ok(Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
            base_url: API_BASE_URL.to_string(),
            inbox,
            inbox_sender,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sender half for webhook routes feeding this adapter.
    pub fn inbox_sender(&self) -> InboxSender {
        self.inbox_sender.clone()
    }
}

/// Extracts inbound direct messages from a Messaging webhook delivery.
///
/// Walks `entry[].messaging[]` and keeps events carrying message text;
/// postbacks, read receipts, and malformed payloads yield nothing.
pub fn parse_webhook(payload: &serde_json::Value) -> Vec<NormalizedMessage> {
    let mut batch = Vec::new();
    let entries = payload
        .get("entry")
        .and_then(|e| e.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();
    for entry in entries {
        let events = entry
            .get("messaging")
            .and_then(|m| m.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        for event in events {
            let Some(sender) = event
                .get("sender")
                .and_then(|s| s.get("id"))
                .and_then(|i| i.as_str())
            else {
                continue;
            };
            let Some(message) = event.get("message") else {
                continue;
            };
            let text = message
                .get("text")
                .and_then(|t| t.as_str())
                .unwrap_or_default();
            if text.is_empty() {
                continue;
            }
            batch.push(NormalizedMessage {
                platform: Platform::Instagram,
                external_user_id: sender.to_string(),
                text: text.to_string(),
                attachment: None,
                platform_message_id: message
                    .get("mid")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string(),
                received_at: Utc::now(),
            });
        }
    }
    batch
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_media: false,
            supports_typing: false,
            max_message_length: Some(1000),
        }
    }

    async fn receive_next(
        &self,
        timeout: Duration,
    ) -> Result<Option<NormalizedMessage>, BotforgeError> {
        self.inbox.pop(timeout).await
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), BotforgeError> {
        let url = format!("{}/me/messages", self.base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "recipient": { "id": target },
                "message": { "text": text },
            }))
            .send()
            .await
            .map_err(|e| map_request_error("instagram", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status("instagram", status, &body));
        }
        Ok(())
    }
}
