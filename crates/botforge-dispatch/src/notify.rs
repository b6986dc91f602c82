// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin notification formatting.
//!
//! Tenants can opt into a short notification for every answered
//! conversation. The copy is redacted: the user id is masked and both
//! the inbound message and the reply are truncated.

use botforge_core::types::Platform;

const MESSAGE_PREVIEW_CHARS: usize = 100;
const RESPONSE_PREVIEW_CHARS: usize = 150;

/// Emoji tag used for the platform line of a notification.
pub fn platform_icon(platform: Platform) -> &'static str {
    match platform {
        Platform::Telegram => "\u{1f4f1}",
        Platform::Instagram => "\u{1f4f7}",
        Platform::WhatsApp => "\u{1f4ac}",
    }
}

/// Masks an external user id, keeping the first three and last two
/// characters. Ids too short to mask meaningfully are hidden entirely.
pub fn mask_user_id(user_id: &str) -> String {
    let chars: Vec<char> = user_id.chars().collect();
    if chars.len() <= 5 {
        return "***".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}***{tail}")
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Renders the notification body sent to a tenant's admin chat.
pub fn format_notification(
    bot_name: &str,
    platform: Platform,
    user_id: &str,
    message: &str,
    response: &str,
    time_hhmm: &str,
) -> String {
    format!(
        "\u{1f514} Yangi suhbat!\n\n\
         {icon} Bot: {bot_name}\n\
         \u{1f464} Mijoz: {user}\n\
         \u{23f0} Vaqt: {time_hhmm}\n\n\
         \u{1f4e9} Mijoz xabari:\n{message}\n\n\
         \u{1f916} Bot javobi:\n{response}",
        icon = platform_icon(platform),
        user = mask_user_id(user_id),
        message = preview(message, MESSAGE_PREVIEW_CHARS),
        response = preview(response, RESPONSE_PREVIEW_CHARS),
    )
}
