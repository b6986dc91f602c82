// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot registry queries.

use botforge_core::BotforgeError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, parse_col};
use crate::models::{Bot, PlatformCredential};

const BOT_COLUMNS: &str = "id, owner_id, name, platform, token, endpoint_id, active, \
     admin_chat_id, notifications_enabled, created_at";

fn map_bot_row(row: &rusqlite::Row<'_>) -> Result<Bot, rusqlite::Error> {
    let platform: String = row.get(3)?;
    Ok(Bot {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        platform: parse_col(3, &platform)?,
        credential: PlatformCredential {
            token: row.get(4)?,
            endpoint_id: row.get(5)?,
        },
        active: row.get(6)?,
        admin_chat_id: row.get(7)?,
        notifications_enabled: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert a bot row. Returns the auto-generated bot ID.
pub async fn insert_bot(db: &Database, bot: &Bot) -> Result<i64, BotforgeError> {
    let owner_id = bot.owner_id;
    let name = bot.name.clone();
    let platform = bot.platform.to_string();
    let token = bot.credential.token.clone();
    let endpoint_id = bot.credential.endpoint_id.clone();
    let active = bot.active;
    let admin_chat_id = bot.admin_chat_id.clone();
    let notifications_enabled = bot.notifications_enabled;

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bots (owner_id, name, platform, token, endpoint_id, active, \
                 admin_chat_id, notifications_enabled) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    owner_id,
                    name,
                    platform,
                    token,
                    endpoint_id,
                    active,
                    admin_chat_id,
                    notifications_enabled,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a bot by ID.
pub async fn get_bot(db: &Database, bot_id: i64) -> Result<Option<Bot>, BotforgeError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = ?1"),
                params![bot_id],
                map_bot_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All bots with the active flag set, oldest first.
pub async fn list_active_bots(db: &Database) -> Result<Vec<Bot>, BotforgeError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOT_COLUMNS} FROM bots WHERE active = 1 ORDER BY id ASC"
            ))?;
            let bots = stmt
                .query_map([], map_bot_row)?
                .collect::<Result<Vec<_>, rusqlite::Error>>()?;
            Ok(bots)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Flip a bot's active flag.
pub async fn set_bot_active(db: &Database, bot_id: i64, active: bool) -> Result<(), BotforgeError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE bots SET active = ?2 WHERE id = ?1",
                params![bot_id, active],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;
    use crate::queries::tenants;
    use botforge_core::{LanguageCode, Tier};
    use botforge_config::StorageConfig;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: false,
        };
        let db = Database::open(&config).await.unwrap();
        tenants::upsert_tenant(&db, 1, Tier::Premium, LanguageCode::Uz, None)
            .await
            .unwrap();
        (db, dir)
    }

    fn make_bot(name: &str, platform: Platform) -> Bot {
        Bot {
            id: 0,
            owner_id: 1,
            name: name.to_string(),
            platform,
            credential: PlatformCredential {
                token: "123456:AAtestToken".to_string(),
                endpoint_id: None,
            },
            active: true,
            admin_chat_id: Some("999".to_string()),
            notifications_enabled: true,
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_bot_roundtrips() {
        let (db, _dir) = setup_db().await;
        let id = insert_bot(&db, &make_bot("shop-bot", Platform::Telegram))
            .await
            .unwrap();

        let bot = get_bot(&db, id).await.unwrap().unwrap();
        assert_eq!(bot.name, "shop-bot");
        assert_eq!(bot.platform, Platform::Telegram);
        assert!(bot.active);
        assert_eq!(bot.admin_chat_id.as_deref(), Some("999"));
        assert!(!bot.created_at.is_empty());
    }

    #[tokio::test]
    async fn get_bot_returns_none_for_unknown_id() {
        let (db, _dir) = setup_db().await;
        assert!(get_bot(&db, 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_active_skips_deactivated_bots() {
        let (db, _dir) = setup_db().await;
        let a = insert_bot(&db, &make_bot("a", Platform::Telegram)).await.unwrap();
        let b = insert_bot(&db, &make_bot("b", Platform::WhatsApp)).await.unwrap();

        set_bot_active(&db, a, false).await.unwrap();

        let active = list_active_bots(&db).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b);

        let stored = get_bot(&db, a).await.unwrap().unwrap();
        assert!(!stored.active);
    }
}
