// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process inbox for webhook-fed platforms.
//!
//! WhatsApp and Instagram deliver inbound messages by webhook rather than
//! long poll. The webhook handler pushes normalized messages into a bot's
//! inbox; the polling worker drains it with a bounded wait so its loop
//! shape matches the long-polling adapters.

use std::time::Duration;

use botforge_core::{BotforgeError, NormalizedMessage};
use tokio::sync::mpsc;
use tracing::warn;

/// Capacity of one bot's inbound queue.
const INBOX_CAPACITY: usize = 100;

/// Sender half handed to webhook routes.
#[derive(Clone)]
pub struct InboxSender {
    tx: mpsc::Sender<NormalizedMessage>,
}

impl InboxSender {
    /// Push an inbound message, dropping it when the bot's worker has
    /// fallen too far behind.
    pub fn push(&self, message: NormalizedMessage) {
        if let Err(e) = self.tx.try_send(message) {
            warn!(error = %e, "inbox full or closed, dropping inbound message");
        }
    }
}

/// Receiver half owned by a platform adapter.
pub struct Inbox {
    rx: tokio::sync::Mutex<mpsc::Receiver<NormalizedMessage>>,
}

impl Inbox {
    /// Create an inbox and its webhook-side sender.
    pub fn new() -> (Self, InboxSender) {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        (
            Self {
                rx: tokio::sync::Mutex::new(rx),
            },
            InboxSender { tx },
        )
    }

    /// Wait up to `timeout` for the next message. `Ok(None)` when the wait
    /// elapses; an error when every sender is gone.
    pub async fn pop(&self, timeout: Duration) -> Result<Option<NormalizedMessage>, BotforgeError> {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(message)) => Ok(Some(message)),
            Ok(None) => Err(BotforgeError::Platform {
                message: "webhook inbox closed".to_string(),
                source: None,
            }),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botforge_core::Platform;
    use chrono::Utc;

    fn make_message(text: &str) -> NormalizedMessage {
        NormalizedMessage {
            platform: Platform::WhatsApp,
            external_user_id: "998901234567".to_string(),
            text: text.to_string(),
            attachment: None,
            platform_message_id: "wamid.test".to_string(),
            received_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn push_then_pop_roundtrips() {
        let (inbox, sender) = Inbox::new();
        sender.push(make_message("hello"));

        let msg = inbox.pop(Duration::from_millis(100)).await.unwrap().unwrap();
        assert_eq!(msg.text, "hello");
    }

    #[tokio::test]
    async fn pop_times_out_to_none() {
        let (inbox, _sender) = Inbox::new();
        let got = inbox.pop(Duration::from_millis(20)).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn pop_errors_when_senders_dropped() {
        let (inbox, sender) = Inbox::new();
        drop(sender);
        assert!(inbox.pop(Duration::from_millis(20)).await.is_err());
    }

    #[tokio::test]
    async fn messages_drain_in_order() {
        let (inbox, sender) = Inbox::new();
        sender.push(make_message("first"));
        sender.push(make_message("second"));

        let a = inbox.pop(Duration::from_millis(50)).await.unwrap().unwrap();
        let b = inbox.pop(Duration::from_millis(50)).await.unwrap().unwrap();
        assert_eq!(a.text, "first");
        assert_eq!(b.text, "second");
    }
}
