// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API adapter.
//!
//! Outbound messages go through the Graph API `/{phone_number_id}/messages`
//! endpoint with a Bearer token. Inbound messages are webhook deliveries
//! pushed into the adapter's [`Inbox`] and drained by the polling worker.

use std::time::Duration;

use async_trait::async_trait;
use botforge_core::{
    AttachmentRef, BotforgeError, ChannelCapabilities, NormalizedMessage, Platform,
    PlatformAdapter,
};
use chrono::Utc;

use crate::http::{map_request_error, map_status};
use crate::inbox::{Inbox, InboxSender};

/// Base URL for the Graph API.
const API_BASE_URL: &str = "https://graph.facebook.com/v18.0";

/// WhatsApp Cloud adapter for one business phone number.
pub struct WhatsAppAdapter {
    client: reqwest::Client,
    token: String,
    phone_number_id: String,
    base_url: String,
    inbox: Inbox,
    inbox_sender: InboxSender,
}

impl WhatsAppAdapter {
    /// Creates an adapter for the given access token and phone number ID.
    pub fn new(token: &str, phone_number_id: &str) -> Result<Self, BotforgeError> {
        if token.is_empty() {
            return Err(BotforgeError::Config(
                "whatsapp access token cannot be empty".to_string(),
            ));
        }
        if phone_number_id.is_empty() {
            return Err(BotforgeError::Config(
                "whatsapp phone_number_id cannot be empty".to_string(),
            ));
        }
        let (inbox, inbox_sender) = Inbox::new();
        Ok(Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
            phone_number_id: phone_number_id.to_string(),
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

    async fn post_message(&self, payload: serde_json::Value) -> Result<(), BotforgeError> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_request_error("whatsapp", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status("whatsapp", status, &body));
        }
        Ok(())
    }
}

/// Extracts inbound messages from a Cloud API webhook delivery.
///
/// Walks `entry[].changes[]` for `field == "messages"` and normalizes the
/// text and image entries; statuses and unsupported types are skipped.
/// A malformed payload yields an empty batch rather than an error so the
/// webhook route can always acknowledge the delivery.
pub fn parse_webhook(payload: &serde_json::Value) -> Vec<NormalizedMessage> {
    let mut batch = Vec::new();
    let entries = payload
        .get("entry")
        .and_then(|e| e.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();
    for entry in entries {
        let changes = entry
            .get("changes")
            .and_then(|c| c.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        for change in changes {
            if change.get("field").and_then(|f| f.as_str()) != Some("messages") {
                continue;
            }
            let messages = change
                .get("value")
                .and_then(|v| v.get("messages"))
                .and_then(|m| m.as_array())
                .map(Vec::as_slice)
                .unwrap_or_default();
            for message in messages {
                let Some(from) = message.get("from").and_then(|f| f.as_str()) else {
                    continue;
                };
                let message_id = message
                    .get("id")
                    .and_then(|i| i.as_str())
                    .unwrap_or_default();
                match message.get("type").and_then(|t| t.as_str()) {
                    Some("text") => {
                        let text = message
                            .get("text")
                            .and_then(|t| t.get("body"))
                            .and_then(|b| b.as_str())
                            .unwrap_or_default();
                        if text.is_empty() {
                            continue;
                        }
                        batch.push(NormalizedMessage {
                            platform: Platform::WhatsApp,
                            external_user_id: from.to_string(),
                            text: text.to_string(),
                            attachment: None,
                            platform_message_id: message_id.to_string(),
                            received_at: Utc::now(),
                        });
                    }
                    Some("image") => {
                        let image = message.get("image");
                        let Some(media_id) =
                            image.and_then(|i| i.get("id")).and_then(|i| i.as_str())
                        else {
                            continue;
                        };
                        batch.push(NormalizedMessage {
                            platform: Platform::WhatsApp,
                            external_user_id: from.to_string(),
                            text: image
                                .and_then(|i| i.get("caption"))
                                .and_then(|c| c.as_str())
                                .unwrap_or_default()
                                .to_string(),
                            attachment: Some(AttachmentRef {
                                media_id: media_id.to_string(),
                                mime_type: image
                                    .and_then(|i| i.get("mime_type"))
                                    .and_then(|m| m.as_str())
                                    .map(str::to_string),
                            }),
                            platform_message_id: message_id.to_string(),
                            received_at: Utc::now(),
                        });
                    }
                    _ => {}
                }
            }
        }
    }
    batch
}

#[async_trait]
impl PlatformAdapter for WhatsAppAdapter {
    fn platform(&self) -> Platform {
        Platform::WhatsApp
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_media: true,
            supports_typing: false,
            max_message_length: Some(4096),
        }
    }

    async fn receive_next(
        &self,
        timeout: Duration,
    ) -> Result<Option<NormalizedMessage>, BotforgeError> {
        self.inbox.pop(timeout).await
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), BotforgeError> {
        self.post_message(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": target,
            "type": "text",
            "text": { "body": text },
        }))
        .await
    }

    async fn send_media(
        &self,
        target: &str,
        attachment: &AttachmentRef,
    ) -> Result<(), BotforgeError> {
        self.post_message(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": target,
            "type": "image",
            "image": { "id": attachment.media_id },
        }))
        .await
    }
}
