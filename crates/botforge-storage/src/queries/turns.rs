// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation turn queries.
//!
//! A turn is written in two steps: the inbound message is inserted with a
//! null response, and the response is filled in later by the delivery path.
//! The fill is guarded so it happens at most once per turn.

use botforge_core::BotforgeError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, parse_col};
use crate::models::{ConversationTurn, NewTurn};

const TURN_COLUMNS: &str =
    "id, bot_id, platform, external_user_id, message, response, language, created_at";

fn map_turn_row(row: &rusqlite::Row<'_>) -> Result<ConversationTurn, rusqlite::Error> {
    let platform: String = row.get(2)?;
    let language: String = row.get(6)?;
    Ok(ConversationTurn {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        platform: parse_col(2, &platform)?,
        external_user_id: row.get(3)?,
        message: row.get(4)?,
        response: row.get(5)?,
        language: parse_col(6, &language)?,
        created_at: row.get(7)?,
    })
}

/// Insert an inbound turn with a null response. Returns the new turn ID.
pub async fn insert_turn(db: &Database, turn: &NewTurn) -> Result<i64, BotforgeError> {
    let bot_id = turn.bot_id;
    let platform = turn.platform.to_string();
    let external_user_id = turn.external_user_id.clone();
    let message = turn.message.clone();
    let language = turn.language.to_string();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_turns (bot_id, platform, external_user_id, message, language) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![bot_id, platform, external_user_id, message, language],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fill the response for a turn. The guard clause makes the transition
/// null-to-set happen at most once; returns `false` when the response was
/// already present and the write was skipped.
pub async fn update_turn_response(
    db: &Database,
    turn_id: i64,
    response: &str,
) -> Result<bool, BotforgeError> {
    let response = response.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE conversation_turns SET response = ?2 \
                 WHERE id = ?1 AND response IS NULL",
                params![turn_id, response],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a turn by ID.
pub async fn get_turn(db: &Database, turn_id: i64) -> Result<Option<ConversationTurn>, BotforgeError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TURN_COLUMNS} FROM conversation_turns WHERE id = ?1"),
                params![turn_id],
                map_turn_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Last `limit` turns for (bot, user), most recent first.
pub async fn recent_turns(
    db: &Database,
    bot_id: i64,
    external_user_id: &str,
    limit: usize,
) -> Result<Vec<ConversationTurn>, BotforgeError> {
    let external_user_id = external_user_id.to_string();
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TURN_COLUMNS} FROM conversation_turns \
                 WHERE bot_id = ?1 AND external_user_id = ?2 \
                 ORDER BY id DESC LIMIT ?3"
            ))?;
            let turns = stmt
                .query_map(params![bot_id, external_user_id, limit], map_turn_row)?
                .collect::<Result<Vec<_>, rusqlite::Error>>()?;
            Ok(turns)
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
        tenants::upsert_tenant(&db, 1, Tier::Premium, LanguageCode::Uz, None)
            .await
            .unwrap();
        let bot_id = bots::insert_bot(
            &db,
            &Bot {
                id: 0,
                owner_id: 1,
                name: "t".to_string(),
                platform: Platform::Telegram,
                credential: PlatformCredential {
                    token: "123:tok".to_string(),
                    endpoint_id: None,
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

    fn make_turn(bot_id: i64, message: &str) -> NewTurn {
        NewTurn {
            bot_id,
            platform: Platform::Telegram,
            external_user_id: "user-1".to_string(),
            message: message.to_string(),
            language: LanguageCode::Uz,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_turn() {
        let (db, bot_id, _dir) = setup_db().await;
        let id = insert_turn(&db, &make_turn(bot_id, "salom")).await.unwrap();

        let turn = get_turn(&db, id).await.unwrap().unwrap();
        assert_eq!(turn.message, "salom");
        assert!(turn.response.is_none());
        assert_eq!(turn.language, LanguageCode::Uz);
    }

    #[tokio::test]
    async fn response_fills_exactly_once() {
        let (db, bot_id, _dir) = setup_db().await;
        let id = insert_turn(&db, &make_turn(bot_id, "narxi qancha?")).await.unwrap();

        assert!(update_turn_response(&db, id, "heel 150000 som").await.unwrap());
        assert!(!update_turn_response(&db, id, "other answer").await.unwrap());

        let turn = get_turn(&db, id).await.unwrap().unwrap();
        assert_eq!(turn.response.as_deref(), Some("heel 150000 som"));
    }

    #[tokio::test]
    async fn recent_turns_are_newest_first_and_limited() {
        let (db, bot_id, _dir) = setup_db().await;
        for i in 0..5 {
            insert_turn(&db, &make_turn(bot_id, &format!("msg-{i}")))
                .await
                .unwrap();
        }

        let turns = recent_turns(&db, bot_id, "user-1", 3).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].message, "msg-4");
        assert_eq!(turns[2].message, "msg-2");
    }

    #[tokio::test]
    async fn recent_turns_scoped_to_user() {
        let (db, bot_id, _dir) = setup_db().await;
        insert_turn(&db, &make_turn(bot_id, "mine")).await.unwrap();
        let mut other = make_turn(bot_id, "theirs");
        other.external_user_id = "user-2".to_string();
        insert_turn(&db, &other).await.unwrap();

        let turns = recent_turns(&db, bot_id, "user-1", 10).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].message, "mine");
    }
}
