// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging platform adapters for the Botforge platform.
//!
//! Each tenant bot gets its own adapter instance built from its stored
//! credential: Telegram long-polls `getUpdates`, WhatsApp Cloud and
//! Instagram send through the Graph API and receive via webhook-fed
//! inboxes. All adapters classify HTTP failures through [`http::map_status`]
//! so retry behavior stays uniform across platforms.

pub mod http;
pub mod inbox;
pub mod instagram;
pub mod telegram;
pub mod whatsapp;

use std::sync::Arc;

use botforge_core::{Bot, BotforgeError, Platform, PlatformAdapter};

pub use inbox::{Inbox, InboxSender};
pub use instagram::InstagramAdapter;
pub use telegram::{TelegramAdapter, is_valid_token};
pub use whatsapp::WhatsAppAdapter;

/// An adapter plus the webhook inbox sender for platforms that have one.
pub struct AdapterHandle {
    pub adapter: Arc<dyn PlatformAdapter>,
    /// `Some` for webhook-fed platforms (WhatsApp, Instagram).
    pub inbox: Option<InboxSender>,
}

/// Build the adapter for a bot from its stored credential.
pub fn make_adapter(bot: &Bot) -> Result<AdapterHandle, BotforgeError> {
    match bot.platform {
        Platform::Telegram => {
            let adapter = TelegramAdapter::new(&bot.credential.token)?;
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                inbox: None,
            })
        }
        Platform::WhatsApp => {
            let phone_number_id = bot.credential.endpoint_id.as_deref().ok_or_else(|| {
                BotforgeError::Config(format!(
                    "bot {} has no phone_number_id for WhatsApp",
                    bot.id
                ))
            })?;
            let adapter = WhatsAppAdapter::new(&bot.credential.token, phone_number_id)?;
            let inbox = adapter.inbox_sender();
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                inbox: Some(inbox),
            })
        }
        Platform::Instagram => {
            let adapter = InstagramAdapter::new(&bot.credential.token)?;
            let inbox = adapter.inbox_sender();
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                inbox: Some(inbox),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botforge_core::PlatformCredential;

    fn make_bot(platform: Platform, token: &str, endpoint_id: Option<&str>) -> Bot {
        Bot {
            id: 1,
            owner_id: 1,
            name: "t".to_string(),
            platform,
            credential: PlatformCredential {
                token: token.to_string(),
                endpoint_id: endpoint_id.map(str::to_string),
            },
            active: true,
            admin_chat_id: None,
            notifications_enabled: false,
            created_at: String::new(),
        }
    }

    #[test]
    fn telegram_factory_validates_token() {
        let ok = make_adapter(&make_bot(Platform::Telegram, "123:abc", None)).unwrap();
        assert_eq!(ok.adapter.platform(), Platform::Telegram);
        assert!(ok.inbox.is_none());

        assert!(make_adapter(&make_bot(Platform::Telegram, "bad token", None)).is_err());
    }

    #[test]
    fn whatsapp_factory_requires_endpoint_id() {
        let ok = make_adapter(&make_bot(Platform::WhatsApp, "tok", Some("123"))).unwrap();
        assert_eq!(ok.adapter.platform(), Platform::WhatsApp);
        assert!(ok.inbox.is_some());

        assert!(make_adapter(&make_bot(Platform::WhatsApp, "tok", None)).is_err());
    }

    #[test]
    fn instagram_factory_builds_inbox() {
        let ok = make_adapter(&make_bot(Platform::Instagram, "tok", None)).unwrap();
        assert_eq!(ok.adapter.platform(), Platform::Instagram);
        assert!(ok.inbox.is_some());
    }
}
