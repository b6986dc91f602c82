// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant and entitlement queries.

use botforge_core::BotforgeError;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, parse_col};
use crate::models::{Entitlement, LanguageCode, Tier};

/// Insert or replace a tenant row.
pub async fn upsert_tenant(
    db: &Database,
    tenant_id: i64,
    tier: Tier,
    language: LanguageCode,
    subscription_until: Option<DateTime<Utc>>,
) -> Result<(), BotforgeError> {
    let tier = tier.to_string();
    let language = language.to_string();
    let until = subscription_until.map(|t| t.to_rfc3339());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tenants (id, tier, language, subscription_until) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(id) DO UPDATE SET \
                 tier = excluded.tier, \
                 language = excluded.language, \
                 subscription_until = excluded.subscription_until",
                params![tenant_id, tier, language, until],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Entitlement snapshot for a tenant, or `None` for an unknown tenant.
pub async fn entitlement(
    db: &Database,
    owner_id: i64,
) -> Result<Option<Entitlement>, BotforgeError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT tier, language, subscription_until FROM tenants WHERE id = ?1",
                params![owner_id],
                |row| {
                    let tier: String = row.get(0)?;
                    let language: String = row.get(1)?;
                    let until: Option<String> = row.get(2)?;
                    let expires_at = match until {
                        Some(raw) => Some(parse_col::<DateTime<Utc>>(2, &raw)?),
                        None => None,
                    };
                    Ok(Entitlement {
                        tier: parse_col(0, &tier)?,
                        language: parse_col(1, &language)?,
                        expires_at,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
