// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Botforge multi-tenant bot platform.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Botforge workspace. Platform adapters,
//! the AI provider, and the storage backend all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BotforgeError;
pub use traits::{AiProvider, PlatformAdapter, StorageAdapter};
pub use types::{
    AttachmentRef, Bot, BotState, ChannelCapabilities, ConversationTurn, Entitlement,
    KnowledgeEntry, KnowledgeKind, LanguageCode, NewTurn, NormalizedMessage, Platform,
    PlatformCredential, TaskRecord, TaskStatus, Tier,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        // If any trait module is missing or has a compile error, this
        // test won't compile.
        fn _assert_platform<T: PlatformAdapter>() {}
        fn _assert_provider<T: AiProvider>() {}
        fn _assert_storage<T: StorageAdapter>() {}
    }

    #[test]
    fn error_maps_the_full_taxonomy() {
        let _config = BotforgeError::Config("test".into());
        let _storage = BotforgeError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _platform = BotforgeError::Platform {
            message: "test".into(),
            source: None,
        };
        let _transient = BotforgeError::Transient {
            message: "test".into(),
            source: None,
        };
        let _provider = BotforgeError::Provider {
            message: "test".into(),
            source: None,
        };
        let _rate = BotforgeError::RateLimited { user: "u".into() };
        let _ent = BotforgeError::EntitlementExpired { owner_id: 1 };
        let _timeout = BotforgeError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _not_found = BotforgeError::NotFound("bot".into());
        let _internal = BotforgeError::Internal("test".into());
    }
}
