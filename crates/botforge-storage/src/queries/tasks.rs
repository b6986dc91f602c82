// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task bookkeeping queries for the response pipeline.

use botforge_core::BotforgeError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, parse_col};
use crate::models::{TaskRecord, TaskStatus};

fn map_task_row(row: &rusqlite::Row<'_>) -> Result<TaskRecord, rusqlite::Error> {
    let status: String = row.get(3)?;
    Ok(TaskRecord {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        attempts: row.get(2)?,
        status: parse_col(3, &status)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Insert a task record.
pub async fn insert_task(db: &Database, task: &TaskRecord) -> Result<(), BotforgeError> {
    let id = task.id.clone();
    let bot_id = task.bot_id;
    let attempts = task.attempts;
    let status = task.status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tasks (id, bot_id, attempts, status) VALUES (?1, ?2, ?3, ?4)",
                params![id, bot_id, attempts, status],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update a task's status and attempt counter, bumping `updated_at`.
pub async fn update_task(
    db: &Database,
    task_id: &str,
    status: TaskStatus,
    attempts: u32,
) -> Result<(), BotforgeError> {
    let task_id = task_id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE tasks SET status = ?2, attempts = ?3, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?1",
                params![task_id, status, attempts],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a task record by ID.
pub async fn get_task(db: &Database, task_id: &str) -> Result<Option<TaskRecord>, BotforgeError> {
    let task_id = task_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, bot_id, attempts, status, created_at, updated_at \
                 FROM tasks WHERE id = ?1",
                params![task_id],
                map_task_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
