// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite database handle shared by all query modules.
//!
//! All access goes through a single tokio-rusqlite background thread. Opening
//! the database applies connection pragmas and runs any pending refinery
//! migrations before the handle is handed out.

use botforge_config::StorageConfig;
use botforge_core::BotforgeError;
use tracing::info;

use crate::migrations;

/// Convert a tokio-rusqlite error into BotforgeError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> BotforgeError {
    BotforgeError::Storage {
        source: Box::new(e),
    }
}

/// Parse a TEXT column into a typed value, reporting failures as a rusqlite
/// conversion error so they surface through the normal query error path.
pub(crate) fn parse_col<T>(idx: usize, raw: &str) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Handle to the Botforge SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open the database at the given path, apply pragmas, and run migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, BotforgeError> {
        let conn = tokio_rusqlite::Connection::open(&config.database_path)
            .await
            .map_err(|e| BotforgeError::Storage {
                source: Box::new(e),
            })?;

        let wal = config.wal_mode;
        conn.call(move |conn| {
            if wal {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(migrations::run_migrations)
            .await
            .map_err(|e| BotforgeError::Storage {
                source: Box::new(e),
            })?;

        info!(path = %config.database_path, wal, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Close the background connection thread.
    pub async fn close(&self) -> Result<(), BotforgeError> {
        self.conn
            .clone()
            .close()
            .await
            .map_err(|e| BotforgeError::Storage {
                source: Box::new(e),
            })
    }
}
