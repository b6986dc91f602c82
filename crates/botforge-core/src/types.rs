// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Botforge workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The messaging platform a bot is bound to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    WhatsApp,
    Instagram,
}

/// Reply language for a tenant's end users.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    #[default]
    Uz,
    Ru,
    En,
}

/// Subscription tier of the owning tenant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Starter,
    Basic,
    Premium,
    Admin,
}

/// Subscription state of a tenant. Read-only to the core; gates whether
/// inbound messages are processed at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub tier: Tier,
    pub expires_at: Option<DateTime<Utc>>,
    pub language: LanguageCode,
}

impl Entitlement {
    /// Free and admin tiers never expire; paid tiers need an unexpired date.
    pub fn is_active(&self) -> bool {
        match self.tier {
            Tier::Free | Tier::Admin => true,
            Tier::Starter | Tier::Basic | Tier::Premium => self
                .expires_at
                .is_some_and(|end| end > Utc::now()),
        }
    }

    /// Free tier is limited to Uzbek; every paid tier unlocks all languages.
    pub fn allows_language(&self, lang: LanguageCode) -> bool {
        match self.tier {
            Tier::Free => lang == LanguageCode::Uz,
            _ => true,
        }
    }
}

/// Platform credential for one bot: an API token plus the extra identifier
/// some platforms require (WhatsApp phone-number id, Instagram page id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCredential {
    pub token: String,
    #[serde(default)]
    pub endpoint_id: Option<String>,
}

/// A tenant-configured conversational bot bound to one platform credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub platform: Platform,
    pub credential: PlatformCredential,
    pub active: bool,
    /// Chat/channel that receives conversation notifications, if configured.
    pub admin_chat_id: Option<String>,
    pub notifications_enabled: bool,
    pub created_at: String,
}

/// Kind of grounding material in a knowledge entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeKind {
    #[default]
    Text,
    Product,
    ImageRef,
}

/// One entry of a bot's knowledge base. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub bot_id: i64,
    pub content: String,
    pub kind: KnowledgeKind,
    pub source_label: Option<String>,
    pub created_at: String,
}

/// One user message and its (eventual) reply. The response field starts
/// null and transitions to set exactly once when the pipeline completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub bot_id: i64,
    pub platform: Platform,
    pub external_user_id: String,
    pub message: String,
    pub response: Option<String>,
    pub language: LanguageCode,
    pub created_at: String,
}

/// Insert shape for a conversation turn. The response field is implicitly
/// null at creation and filled later by the delivery stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTurn {
    pub bot_id: i64,
    pub platform: Platform,
    pub external_user_id: String,
    pub message: String,
    pub language: LanguageCode,
}

/// Reference to a media attachment on an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Platform-native file or media identifier.
    pub media_id: String,
    pub mime_type: Option<String>,
}

/// Platform-neutral shape of an inbound update, produced by every adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub platform: Platform,
    pub external_user_id: String,
    pub text: String,
    pub attachment: Option<AttachmentRef>,
    /// Platform-native message id. Carried for future dedup; inbound
    /// updates are currently NOT deduplicated by it (see DESIGN.md).
    pub platform_message_id: String,
    pub received_at: DateTime<Utc>,
}

/// Capabilities reported by a platform adapter.
#[derive(Debug, Clone, Default)]
pub struct ChannelCapabilities {
    pub supports_media: bool,
    pub supports_typing: bool,
    pub max_message_length: Option<usize>,
}

/// Lifecycle status of an asynchronous generation task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    FailedRetryable,
    FailedTerminal,
}

impl TaskStatus {
    /// Terminal statuses are never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::FailedTerminal)
    }
}

/// Bookkeeping record for one queued generation task. Created on enqueue
/// and mutated only by the response pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub bot_id: i64,
    pub attempts: u32,
    pub status: TaskStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-bot worker state as tracked by the lifecycle manager.
///
/// Transitions: `Stopped -> Starting -> Running -> {Error, Stopping -> Stopped}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BotState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    #[test]
    fn platform_round_trips_lowercase() {
        for p in [Platform::Telegram, Platform::WhatsApp, Platform::Instagram] {
            let s = p.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(Platform::from_str(&s).unwrap(), p);
        }
    }

    #[test]
    fn free_entitlement_is_always_active_but_uzbek_only() {
        let ent = Entitlement {
            tier: Tier::Free,
            expires_at: None,
            language: LanguageCode::Uz,
        };
        assert!(ent.is_active());
        assert!(ent.allows_language(LanguageCode::Uz));
        assert!(!ent.allows_language(LanguageCode::Ru));
        assert!(!ent.allows_language(LanguageCode::En));
    }

    #[test]
    fn paid_entitlement_requires_unexpired_date() {
        let active = Entitlement {
            tier: Tier::Premium,
            expires_at: Some(Utc::now() + Duration::days(10)),
            language: LanguageCode::Ru,
        };
        assert!(active.is_active());
        assert!(active.allows_language(LanguageCode::En));

        let expired = Entitlement {
            tier: Tier::Basic,
            expires_at: Some(Utc::now() - Duration::seconds(1)),
            language: LanguageCode::Uz,
        };
        assert!(!expired.is_active());

        let missing_date = Entitlement {
            tier: Tier::Starter,
            expires_at: None,
            language: LanguageCode::Uz,
        };
        assert!(!missing_date.is_active());
    }

    #[test]
    fn admin_never_expires() {
        let ent = Entitlement {
            tier: Tier::Admin,
            expires_at: Some(Utc::now() - Duration::days(30)),
            language: LanguageCode::En,
        };
        assert!(ent.is_active());
    }

    #[test]
    fn task_status_terminality() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::FailedTerminal.is_terminal());
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::FailedRetryable.is_terminal());
    }

    #[test]
    fn task_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::FailedRetryable).unwrap();
        assert_eq!(json, "\"failed_retryable\"");
    }

    #[test]
    fn bot_state_display() {
        assert_eq!(BotState::Running.to_string(), "running");
        assert_eq!(BotState::Error.to_string(), "error");
    }

    #[test]
    fn language_defaults_to_uzbek() {
        assert_eq!(LanguageCode::default(), LanguageCode::Uz);
    }
}
