// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply delivery: persist the response, re-check the bot, send, notify.

use std::sync::Arc;

use botforge_core::error::BotforgeError;
use botforge_core::traits::{PlatformAdapter, StorageAdapter};
use botforge_core::types::Bot;
use chrono::Local;
use tracing::{debug, info, warn};

use crate::notify::format_notification;

/// What happened to a reply handed to [`Dispatcher::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The reply went out to the user.
    Sent,
    /// The reply was not sent: the turn already had a response, or the
    /// bot was deactivated while the reply was being generated.
    Suppressed,
}

/// Delivers generated replies and fans out admin notifications.
///
/// Delivery is send-oriented: a failed persistence write is logged and
/// the reply still goes out, while a deactivated bot keeps its persisted
/// response without an outbound message.
pub struct Dispatcher {
    storage: Arc<dyn StorageAdapter>,
}

impl Dispatcher {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Persists `reply` onto `turn_id`, re-validates the bot, and sends
    /// the reply to `target` through `adapter`.
    ///
    /// The response column is write-once; a turn that already carries a
    /// response suppresses the send so a user never sees the same reply
    /// twice. A bot deactivated mid-generation also suppresses the send,
    /// but the response stays persisted for the conversation record.
    pub async fn deliver(
        &self,
        adapter: &dyn PlatformAdapter,
        bot: &Bot,
        target: &str,
        reply: &str,
        turn_id: i64,
        user_message: &str,
    ) -> Result<DeliveryOutcome, BotforgeError> {
        match self.storage.update_turn_response(turn_id, reply).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(turn_id, bot_id = bot.id, "turn already answered, suppressing send");
                return Ok(DeliveryOutcome::Suppressed);
            }
            Err(e) => {
                warn!(turn_id, bot_id = bot.id, error = %e, "failed to persist response, sending anyway");
            }
        }

        // The bot may have been stopped or deactivated while the reply
        // was being generated; storage is authoritative here, not the
        // snapshot the pipeline captured at enqueue time.
        let current = match self.storage.get_bot(bot.id).await {
            Ok(current) => current,
            Err(e) => {
                warn!(bot_id = bot.id, error = %e, "bot re-read failed, assuming still active");
                Some(bot.clone())
            }
        };
        let current = match current {
            Some(current) if current.active => current,
            _ => {
                info!(bot_id = bot.id, turn_id, "bot inactive at delivery, response persisted only");
                return Ok(DeliveryOutcome::Suppressed);
            }
        };

        adapter.send(target, reply).await?;

        if current.notifications_enabled {
            if let Some(admin_chat_id) = &current.admin_chat_id {
                self.notify_admin(adapter, &current, admin_chat_id, target, user_message, reply)
                    .await;
            }
        }

        Ok(DeliveryOutcome::Sent)
    }

    /// Best-effort admin notification; a failure is logged and never
    /// affects the delivery that triggered it.
    async fn notify_admin(
        &self,
        adapter: &dyn PlatformAdapter,
        bot: &Bot,
        admin_chat_id: &str,
        external_user_id: &str,
        user_message: &str,
        reply: &str,
    ) {
        let time_hhmm = Local::now().format("%H:%M").to_string();
        let body = format_notification(
            &bot.name,
            bot.platform,
            external_user_id,
            user_message,
            reply,
            &time_hhmm,
        );
        if let Err(e) = adapter.send(admin_chat_id, &body).await {
            warn!(bot_id = bot.id, error = %e, "admin notification failed");
        }
    }
}
