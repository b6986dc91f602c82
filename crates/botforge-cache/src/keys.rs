// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache key construction.
//!
//! All keys share the `botforge:` prefix so an operator inspecting the
//! cache can tell the namespaces apart at a glance.

use sha2::{Digest, Sha256};

use botforge_core::Platform;

/// Knowledge-base snapshot for one bot.
pub fn kb_key(bot_id: i64) -> String {
    format!("botforge:kb:{bot_id}")
}

/// Fixed-window rate counter for one end user on one platform.
pub fn rate_key(platform: Platform, external_user_id: &str) -> String {
    format!("botforge:rate:{platform}:{external_user_id}")
}

/// Cached per-user context (language, entitlement snapshot).
pub fn user_ctx_key(bot_id: i64, external_user_id: &str) -> String {
    format!("botforge:user:{bot_id}:{external_user_id}")
}

/// Memoized AI response for one (bot, message) pair.
pub fn response_key(bot_id: i64, message: &str) -> String {
    format!("botforge:ai_response:{}", message_hash(bot_id, message))
}

/// Stable hash over (bot id, message text) for response memoization.
pub fn message_hash(bot_id: i64, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bot_id.to_le_bytes());
    hasher.update(message.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(kb_key(7), "botforge:kb:7");
        assert_eq!(
            rate_key(Platform::Telegram, "42"),
            "botforge:rate:telegram:42"
        );
        assert_eq!(user_ctx_key(7, "42"), "botforge:user:7:42");
        assert!(response_key(7, "salom").starts_with("botforge:ai_response:"));
    }

    #[test]
    fn message_hash_is_stable_and_distinct() {
        let a = message_hash(1, "narxi qancha?");
        let b = message_hash(1, "narxi qancha?");
        let c = message_hash(2, "narxi qancha?");
        let d = message_hash(1, "salom");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
