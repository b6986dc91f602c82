// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction for the AI provider.

use botforge_core::LanguageCode;

/// Language-specific system prompt for a tenant bot.
///
/// Every bot speaks plain text (no markdown) in its owner's configured
/// language, with a friendly tone and emoji.
pub fn system_prompt(bot_name: &str, language: LanguageCode) -> String {
    match language {
        LanguageCode::Uz => format!(
            "Sen {bot_name} nomli chatbot san. Har doim o'zbek tilida javob ber. \
             Dostona, foydali va emotsiyalik bo'ling. Emoji ishlating. \
             Markdown formatini ishlamang, faqat oddiy matn."
        ),
        LanguageCode::Ru => format!(
            "Ты чатбот по имени {bot_name}. Всегда отвечай на русском языке. \
             Будь дружелюбным, полезным и эмоциональным. Используй эмодзи. \
             Не используй формат Markdown, только простой текст."
        ),
        LanguageCode::En => format!(
            "You are a chatbot named {bot_name}. Always respond in English. \
             Be friendly, helpful and emotional. Use emojis. \
             Don't use Markdown format, only plain text."
        ),
    }
}

/// Assembled prompt parts for one generation request.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub system_prompt: String,
    /// Squeezed knowledge snapshot; empty when the bot has no entries.
    pub knowledge: String,
    /// Recent turns rendered oldest-first as `User:`/`Bot:` lines.
    pub history: String,
    pub message: String,
    pub language: LanguageCode,
}

impl PromptContext {
    /// Render the final prompt string sent to the provider.
    pub fn render(&self) -> String {
        let mut prompt = self.system_prompt.clone();
        if !self.knowledge.is_empty() {
            prompt.push_str("\n\nQo'shimcha ma'lumot: ");
            prompt.push_str(&self.knowledge);
        }
        if !self.history.is_empty() {
            prompt.push_str("\n\nOldingi suhbat:\n");
            prompt.push_str(&self.history);
        }
        prompt.push_str("\n\nFoydalanuvchi savoli: ");
        prompt.push_str(&self.message);
        prompt
    }
}
