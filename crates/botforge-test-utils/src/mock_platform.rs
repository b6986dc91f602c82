// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock platform adapter for deterministic testing.
//!
//! `MockPlatform` implements `PlatformAdapter` with injectable inbound
//! messages and captured outbound sends for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use botforge_core::{
    BotforgeError, ChannelCapabilities, NormalizedMessage, Platform, PlatformAdapter,
};

/// A sent (target, text) pair captured by [`MockPlatform::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub target: String,
    pub text: String,
}

/// A mock messaging platform for testing.
///
/// Provides two queues:
/// - **inbound**: Messages injected via `inject_message()` are returned by `receive_next()`
/// - **sent**: Messages passed to `send()` are captured and retrievable via `sent_messages()`
pub struct MockPlatform {
    platform: Platform,
    inbound: Arc<Mutex<VecDeque<NormalizedMessage>>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    notify: Arc<Notify>,
    fail_sends: Arc<Mutex<bool>>,
}

impl MockPlatform {
    /// Create a new mock adapter posing as the given platform.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            fail_sends: Arc::new(Mutex::new(false)),
        }
    }

    /// Inject an inbound message into the receive queue.
    pub async fn inject_message(&self, msg: NormalizedMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Convenience: inject a plain text message from the given user.
    pub async fn inject_text(&self, external_user_id: &str, text: &str) {
        self.inject_message(NormalizedMessage {
            platform: self.platform,
            external_user_id: external_user_id.to_string(),
            text: text.to_string(),
            attachment: None,
            platform_message_id: uuid::Uuid::new_v4().to_string(),
            received_at: chrono::Utc::now(),
        })
        .await;
    }

    /// All messages sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Make subsequent `send()` calls fail with a transient error.
    pub async fn set_fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().await = fail;
    }
}

#[async_trait]
impl PlatformAdapter for MockPlatform {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_media: false,
            supports_typing: false,
            max_message_length: None,
        }
    }

    async fn receive_next(
        &self,
        timeout: Duration,
    ) -> Result<Option<NormalizedMessage>, BotforgeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(Some(msg));
                }
            }
            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), BotforgeError> {
        if *self.fail_sends.lock().await {
            return Err(BotforgeError::Transient {
                message: "mock send failure".to_string(),
                source: None,
            });
        }
        self.sent.lock().await.push(SentMessage {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_next_returns_injected_message() {
        let platform = MockPlatform::new(Platform::Telegram);
        platform.inject_text("user-1", "hello").await;

        let msg = platform
            .receive_next(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.external_user_id, "user-1");
    }

    #[tokio::test]
    async fn receive_next_times_out_to_none() {
        let platform = MockPlatform::new(Platform::Telegram);
        let got = platform
            .receive_next(Duration::from_millis(20))
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn receive_next_wakes_on_late_injection() {
        let platform = Arc::new(MockPlatform::new(Platform::WhatsApp));
        let cloned = platform.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            cloned.inject_text("user-2", "delayed").await;
        });

        let msg = platform
            .receive_next(Duration::from_secs(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.text, "delayed");
    }

    #[tokio::test]
    async fn send_captures_messages() {
        let platform = MockPlatform::new(Platform::Instagram);
        platform.send("user-9", "reply").await.unwrap();

        let sent = platform.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].target, "user-9");
        assert_eq!(sent[0].text, "reply");
    }

    #[tokio::test]
    async fn failing_sends_return_transient_error() {
        let platform = MockPlatform::new(Platform::Telegram);
        platform.set_fail_sends(true).await;
        let err = platform.send("u", "x").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(platform.sent_count().await, 0);
    }
}
