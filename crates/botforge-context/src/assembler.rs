// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context assembly for one inbound message.
//!
//! Combines three inputs into a [`PromptContext`]: the cached knowledge
//! snapshot (30 minute TTL, squeezed with price pinning), always-fresh
//! recent conversation turns, and the language-specific system prompt.

use std::sync::Arc;
use std::time::Duration;

use botforge_cache::{MemoryCache, keys};
use botforge_config::ContextConfig;
use botforge_core::{Bot, BotforgeError, ConversationTurn, LanguageCode, StorageAdapter};
use tracing::warn;

use crate::price;
use crate::prompt::{PromptContext, system_prompt};

/// Builds prompt contexts for the response pipeline.
pub struct ContextAssembler {
    storage: Arc<dyn StorageAdapter>,
    cache: Arc<MemoryCache>,
    max_context_chars: usize,
    history_turns: usize,
    kb_ttl: Duration,
}

impl ContextAssembler {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        cache: Arc<MemoryCache>,
        config: &ContextConfig,
        kb_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            cache,
            max_context_chars: config.max_context_chars,
            history_turns: config.history_turns,
            kb_ttl,
        }
    }

    /// Assemble the prompt context for one inbound message.
    ///
    /// The knowledge snapshot is served from cache; history is always a
    /// fresh read so the immediately preceding turn is visible. A failed
    /// history read degrades to an empty history rather than failing the
    /// whole assembly.
    pub async fn assemble(
        &self,
        bot: &Bot,
        external_user_id: &str,
        message: &str,
        language: LanguageCode,
    ) -> Result<PromptContext, BotforgeError> {
        let snapshot = self.knowledge_snapshot(bot.id).await?;
        let knowledge = price::squeeze(&snapshot, self.max_context_chars);

        let history = match self
            .storage
            .recent_turns(bot.id, external_user_id, self.history_turns)
            .await
        {
            Ok(turns) => render_history(&turns),
            Err(e) => {
                warn!(bot_id = bot.id, error = %e, "history read failed, continuing without");
                String::new()
            }
        };

        Ok(PromptContext {
            system_prompt: system_prompt(&bot.name, language),
            knowledge,
            history,
            message: message.to_string(),
            language,
        })
    }

    /// The joined knowledge base for a bot, cached under the kb key.
    async fn knowledge_snapshot(&self, bot_id: i64) -> Result<String, BotforgeError> {
        let storage = self.storage.clone();
        self.cache
            .get_or_populate(&keys::kb_key(bot_id), self.kb_ttl, || async move {
                let entries = storage.knowledge_for_bot(bot_id).await?;
                let joined = entries
                    .iter()
                    .map(|e| e.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                Ok(joined)
            })
            .await
    }

    /// Drop the cached knowledge snapshot for a bot, forcing a re-read.
    pub fn invalidate_knowledge(&self, bot_id: i64) {
        self.cache.invalidate(&keys::kb_key(bot_id));
    }
}

/// Render turns (given newest-first) as oldest-first `User:`/`Bot:` lines.
fn render_history(turns: &[ConversationTurn]) -> String {
    let mut out = String::new();
    for turn in turns.iter().rev() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("User: ");
        out.push_str(&turn.message);
        if let Some(response) = &turn.response {
            out.push_str("\nBot: ");
            out.push_str(response);
        }
    }
    out
}
