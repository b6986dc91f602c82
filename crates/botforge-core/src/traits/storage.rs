// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the persistence collaborators the core consumes.

use async_trait::async_trait;

use crate::error::BotforgeError;
use crate::types::{
    Bot, ConversationTurn, Entitlement, KnowledgeEntry, NewTurn, TaskRecord, TaskStatus,
};

/// Persistence boundary of the core: bots, knowledge entries, conversation
/// turns, tenant entitlements, and task bookkeeping.
///
/// Every operation is one independent transaction; there are no long-lived
/// cross-worker transactions and no distributed locks.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Runs migrations and opens connections.
    async fn initialize(&self) -> Result<(), BotforgeError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), BotforgeError>;

    // --- Bots ---

    async fn get_bot(&self, bot_id: i64) -> Result<Option<Bot>, BotforgeError>;

    async fn list_active_bots(&self) -> Result<Vec<Bot>, BotforgeError>;

    /// Flips the active flag; used by the lifecycle manager when a worker
    /// exhausts its restart budget.
    async fn set_bot_active(&self, bot_id: i64, active: bool) -> Result<(), BotforgeError>;

    // --- Knowledge base (read-only to the core) ---

    async fn knowledge_for_bot(&self, bot_id: i64) -> Result<Vec<KnowledgeEntry>, BotforgeError>;

    // --- Conversation turns ---

    /// Creates a turn with a null response; returns the new turn id.
    async fn save_turn(&self, turn: &NewTurn) -> Result<i64, BotforgeError>;

    /// Fills the response field exactly once. Returns `false` when the
    /// response was already set (the write is skipped, not overwritten).
    async fn update_turn_response(
        &self,
        turn_id: i64,
        response: &str,
    ) -> Result<bool, BotforgeError>;

    /// Last `limit` turns for (bot, user), most recent first. Always a
    /// fresh read; short-term memory must reflect the latest turn.
    async fn recent_turns(
        &self,
        bot_id: i64,
        external_user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, BotforgeError>;

    // --- Entitlements (read-only to the core) ---

    async fn entitlement(&self, owner_id: i64) -> Result<Option<Entitlement>, BotforgeError>;

    // --- Task records ---

    async fn create_task(&self, task: &TaskRecord) -> Result<(), BotforgeError>;

    async fn update_task(
        &self,
        task_id: &str,
        status: TaskStatus,
        attempts: u32,
    ) -> Result<(), BotforgeError>;

    async fn get_task(&self, task_id: &str) -> Result<Option<TaskRecord>, BotforgeError>;
}
