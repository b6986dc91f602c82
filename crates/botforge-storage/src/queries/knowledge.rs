// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge base queries. Read-mostly; entries are authored out of band.

use botforge_core::BotforgeError;
use rusqlite::params;

use crate::database::{Database, parse_col};
use crate::models::{KnowledgeEntry, KnowledgeKind};

fn map_entry_row(row: &rusqlite::Row<'_>) -> Result<KnowledgeEntry, rusqlite::Error> {
    let kind: String = row.get(2)?;
    Ok(KnowledgeEntry {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        kind: parse_col(2, &kind)?,
        content: row.get(3)?,
        source_label: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a knowledge entry. Returns the auto-generated entry ID.
pub async fn insert_entry(
    db: &Database,
    bot_id: i64,
    kind: KnowledgeKind,
    content: &str,
    source_label: Option<&str>,
) -> Result<i64, BotforgeError> {
    let kind = kind.to_string();
    let content = content.to_string();
    let source_label = source_label.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO knowledge_entries (bot_id, kind, content, source_label) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![bot_id, kind, content, source_label],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All knowledge entries for a bot, oldest first.
pub async fn entries_for_bot(
    db: &Database,
    bot_id: i64,
) -> Result<Vec<KnowledgeEntry>, BotforgeError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, bot_id, kind, content, source_label, created_at \
                 FROM knowledge_entries WHERE bot_id = ?1 ORDER BY id ASC",
            )?;
            let entries = stmt
                .query_map(params![bot_id], map_entry_row)?
                .collect::<Result<Vec<_>, rusqlite::Error>>()?;
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bot, LanguageCode, Platform, PlatformCredential, Tier};
    use crate::queries::{bots, tenants};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = botforge_config::StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: false,
        };
        let db = Database::open(&config).await.unwrap();
        tenants::upsert_tenant(&db, 1, Tier::Basic, LanguageCode::Uz, None)
            .await
            .unwrap();
        let bot_id = bots::insert_bot(
            &db,
            &Bot {
                id: 0,
                owner_id: 1,
                name: "kb".to_string(),
                platform: Platform::Instagram,
                credential: PlatformCredential {
                    token: "page-token".to_string(),
                    endpoint_id: Some("page-1".to_string()),
                },
                active: true,
                admin_chat_id: None,
                notifications_enabled: false,
                created_at: String::new(),
            },
        )
        .await
        .unwrap();
        (db, bot_id, dir)
    }

    #[tokio::test]
    async fn entries_roundtrip_in_insert_order() {
        let (db, bot_id, _dir) = setup_db().await;
        insert_entry(&db, bot_id, KnowledgeKind::Text, "We sell shoes", None)
            .await
            .unwrap();
        insert_entry(
            &db,
            bot_id,
            KnowledgeKind::Product,
            "Tufli narxi 150000 som",
            Some("catalog"),
        )
        .await
        .unwrap();

        let entries = entries_for_bot(&db, bot_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, KnowledgeKind::Text);
        assert_eq!(entries[1].kind, KnowledgeKind::Product);
        assert_eq!(entries[1].source_label.as_deref(), Some("catalog"));
    }

    #[tokio::test]
    async fn empty_knowledge_base_yields_empty_vec() {
        let (db, bot_id, _dir) = setup_db().await;
        assert!(entries_for_bot(&db, bot_id).await.unwrap().is_empty());
    }
}
