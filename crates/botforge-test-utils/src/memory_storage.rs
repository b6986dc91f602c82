// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `StorageAdapter` implementation for tests.
//!
//! Mirrors the semantics of the SQLite adapter closely enough for unit
//! tests: auto-incremented turn ids, the write-once response guard, and
//! newest-first `recent_turns`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use botforge_core::{
    Bot, BotforgeError, ConversationTurn, Entitlement, KnowledgeEntry, NewTurn, StorageAdapter,
    TaskRecord, TaskStatus,
};

#[derive(Default)]
struct Inner {
    bots: HashMap<i64, Bot>,
    knowledge: HashMap<i64, Vec<KnowledgeEntry>>,
    turns: Vec<ConversationTurn>,
    next_turn_id: i64,
    entitlements: HashMap<i64, Entitlement>,
    tasks: HashMap<String, TaskRecord>,
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a bot row.
    pub async fn add_bot(&self, bot: Bot) {
        self.inner.lock().await.bots.insert(bot.id, bot);
    }

    /// Append a knowledge entry for a bot.
    pub async fn add_knowledge(&self, entry: KnowledgeEntry) {
        self.inner
            .lock()
            .await
            .knowledge
            .entry(entry.bot_id)
            .or_default()
            .push(entry);
    }

    /// Set the entitlement returned for an owner.
    pub async fn set_entitlement(&self, owner_id: i64, entitlement: Entitlement) {
        self.inner
            .lock()
            .await
            .entitlements
            .insert(owner_id, entitlement);
    }

    /// All stored turns, oldest first.
    pub async fn all_turns(&self) -> Vec<ConversationTurn> {
        self.inner.lock().await.turns.clone()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), BotforgeError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), BotforgeError> {
        Ok(())
    }

    async fn get_bot(&self, bot_id: i64) -> Result<Option<Bot>, BotforgeError> {
        Ok(self.inner.lock().await.bots.get(&bot_id).cloned())
    }

    async fn list_active_bots(&self) -> Result<Vec<Bot>, BotforgeError> {
        let inner = self.inner.lock().await;
        let mut bots: Vec<Bot> = inner.bots.values().filter(|b| b.active).cloned().collect();
        bots.sort_by_key(|b| b.id);
        Ok(bots)
    }

    async fn set_bot_active(&self, bot_id: i64, active: bool) -> Result<(), BotforgeError> {
        let mut inner = self.inner.lock().await;
        if let Some(bot) = inner.bots.get_mut(&bot_id) {
            bot.active = active;
        }
        Ok(())
    }

    async fn knowledge_for_bot(&self, bot_id: i64) -> Result<Vec<KnowledgeEntry>, BotforgeError> {
        Ok(self
            .inner
            .lock()
            .await
            .knowledge
            .get(&bot_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_turn(&self, turn: &NewTurn) -> Result<i64, BotforgeError> {
        let mut inner = self.inner.lock().await;
        inner.next_turn_id += 1;
        let id = inner.next_turn_id;
        inner.turns.push(ConversationTurn {
            id,
            bot_id: turn.bot_id,
            platform: turn.platform,
            external_user_id: turn.external_user_id.clone(),
            message: turn.message.clone(),
            response: None,
            language: turn.language,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        Ok(id)
    }

    async fn update_turn_response(
        &self,
        turn_id: i64,
        response: &str,
    ) -> Result<bool, BotforgeError> {
        let mut inner = self.inner.lock().await;
        match inner.turns.iter_mut().find(|t| t.id == turn_id) {
            Some(turn) if turn.response.is_none() => {
                turn.response = Some(response.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn recent_turns(
        &self,
        bot_id: i64,
        external_user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, BotforgeError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .turns
            .iter()
            .rev()
            .filter(|t| t.bot_id == bot_id && t.external_user_id == external_user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn entitlement(&self, owner_id: i64) -> Result<Option<Entitlement>, BotforgeError> {
        Ok(self.inner.lock().await.entitlements.get(&owner_id).cloned())
    }

    async fn create_task(&self, task: &TaskRecord) -> Result<(), BotforgeError> {
        self.inner
            .lock()
            .await
            .tasks
            .insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update_task(
        &self,
        task_id: &str,
        status: TaskStatus,
        attempts: u32,
    ) -> Result<(), BotforgeError> {
        let mut inner = self.inner.lock().await;
        if let Some(task) = inner.tasks.get_mut(task_id) {
            task.status = status;
            task.attempts = attempts;
            task.updated_at = chrono::Utc::now().to_rfc3339();
        }
        Ok(())
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<TaskRecord>, BotforgeError> {
        Ok(self.inner.lock().await.tasks.get(task_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botforge_core::{LanguageCode, Platform, PlatformCredential};

    fn make_bot(id: i64, active: bool) -> Bot {
        Bot {
            id,
            owner_id: 1,
            name: format!("bot-{id}"),
            platform: Platform::Telegram,
            credential: PlatformCredential {
                token: "123:tok".to_string(),
                endpoint_id: None,
            },
            active,
            admin_chat_id: None,
            notifications_enabled: false,
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn active_bots_are_filtered_and_sorted() {
        let storage = MemoryStorage::new();
        storage.add_bot(make_bot(2, true)).await;
        storage.add_bot(make_bot(1, true)).await;
        storage.add_bot(make_bot(3, false)).await;

        let active = storage.list_active_bots().await.unwrap();
        assert_eq!(active.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn turn_response_sets_once() {
        let storage = MemoryStorage::new();
        let id = storage
            .save_turn(&NewTurn {
                bot_id: 1,
                platform: Platform::Telegram,
                external_user_id: "u".to_string(),
                message: "hi".to_string(),
                language: LanguageCode::Uz,
            })
            .await
            .unwrap();

        assert!(storage.update_turn_response(id, "first").await.unwrap());
        assert!(!storage.update_turn_response(id, "second").await.unwrap());
        assert!(!storage.update_turn_response(999, "missing").await.unwrap());

        let turns = storage.recent_turns(1, "u", 5).await.unwrap();
        assert_eq!(turns[0].response.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn recent_turns_newest_first() {
        let storage = MemoryStorage::new();
        for i in 0..4 {
            storage
                .save_turn(&NewTurn {
                    bot_id: 1,
                    platform: Platform::Telegram,
                    external_user_id: "u".to_string(),
                    message: format!("m{i}"),
                    language: LanguageCode::Uz,
                })
                .await
                .unwrap();
        }
        let turns = storage.recent_turns(1, "u", 2).await.unwrap();
        assert_eq!(turns[0].message, "m3");
        assert_eq!(turns[1].message, "m2");
    }
}
