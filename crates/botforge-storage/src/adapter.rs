// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use botforge_config::StorageConfig;
use botforge_core::{
    Bot, BotforgeError, ConversationTurn, Entitlement, KnowledgeEntry, NewTurn, StorageAdapter,
    TaskRecord, TaskStatus,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, BotforgeError> {
        self.db.get().ok_or_else(|| BotforgeError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), BotforgeError> {
        let db = Database::open(&self.config).await?;
        self.db.set(db).map_err(|_| BotforgeError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), BotforgeError> {
        let db = self.db()?;
        // Checkpoint WAL before close.
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Bots ---

    async fn get_bot(&self, bot_id: i64) -> Result<Option<Bot>, BotforgeError> {
        queries::bots::get_bot(self.db()?, bot_id).await
    }

    async fn list_active_bots(&self) -> Result<Vec<Bot>, BotforgeError> {
        queries::bots::list_active_bots(self.db()?).await
    }

    async fn set_bot_active(&self, bot_id: i64, active: bool) -> Result<(), BotforgeError> {
        queries::bots::set_bot_active(self.db()?, bot_id, active).await
    }

    // --- Knowledge base ---

    async fn knowledge_for_bot(&self, bot_id: i64) -> Result<Vec<KnowledgeEntry>, BotforgeError> {
        queries::knowledge::entries_for_bot(self.db()?, bot_id).await
    }

    // --- Conversation turns ---

    async fn save_turn(&self, turn: &NewTurn) -> Result<i64, BotforgeError> {
        queries::turns::insert_turn(self.db()?, turn).await
    }

    async fn update_turn_response(
        &self,
        turn_id: i64,
        response: &str,
    ) -> Result<bool, BotforgeError> {
        queries::turns::update_turn_response(self.db()?, turn_id, response).await
    }

    async fn recent_turns(
        &self,
        bot_id: i64,
        external_user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, BotforgeError> {
        queries::turns::recent_turns(self.db()?, bot_id, external_user_id, limit).await
    }

    // --- Entitlements ---

    async fn entitlement(&self, owner_id: i64) -> Result<Option<Entitlement>, BotforgeError> {
        queries::tenants::entitlement(self.db()?, owner_id).await
    }

    // --- Task records ---

    async fn create_task(&self, task: &TaskRecord) -> Result<(), BotforgeError> {
        queries::tasks::insert_task(self.db()?, task).await
    }

    async fn update_task(
        &self,
        task_id: &str,
        status: TaskStatus,
        attempts: u32,
    ) -> Result<(), BotforgeError> {
        queries::tasks::update_task(self.db()?, task_id, status, attempts).await
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<TaskRecord>, BotforgeError> {
        queries::tasks::get_task(self.db()?, task_id).await
    }
}
