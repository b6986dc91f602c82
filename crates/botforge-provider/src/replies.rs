// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned localized replies sent when generation cannot run.

use botforge_core::LanguageCode;

/// Reply delivered when generation fails terminally.
pub fn fallback_reply(language: LanguageCode) -> &'static str {
    match language {
        LanguageCode::Uz => {
            "Kechirasiz, hozir javob bera olmayapman. Iltimos, keyinroq urinib ko'ring. \u{1f916}"
        }
        LanguageCode::Ru => {
            "Извините, сейчас не могу ответить. Пожалуйста, попробуйте позже. \u{1f916}"
        }
        LanguageCode::En => "Sorry, I can't respond right now. Please try again later. \u{1f916}",
    }
}

/// Reply delivered when the bot owner's subscription has lapsed.
pub fn expired_reply(language: LanguageCode) -> &'static str {
    match language {
        LanguageCode::Uz => "\u{1f512} Obunangiz tugagan! Iltimos, obunani yangilang.",
        LanguageCode::Ru => "\u{1f512} Ваша подписка истекла! Пожалуйста, продлите подписку.",
        LanguageCode::En => "\u{1f512} Your subscription has expired! Please renew it.",
    }
}

/// Reply delivered when a user exceeds the per-user message rate.
pub fn rate_limited_reply(language: LanguageCode) -> &'static str {
    match language {
        LanguageCode::Uz => {
            "\u{26a0}\u{fe0f} Juda ko'p xabar yuboryapsiz. Iltimos, bir oz kuting."
        }
        LanguageCode::Ru => {
            "\u{26a0}\u{fe0f} Вы отправляете слишком много сообщений. Пожалуйста, подождите немного."
        }
        LanguageCode::En => {
            "\u{26a0}\u{fe0f} You are sending too many messages. Please wait a moment."
        }
    }
}
