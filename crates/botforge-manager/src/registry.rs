// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of running bot workers.
//!
//! The registry is shared state between the lifecycle manager and the
//! gateway: one entry per running (or errored) bot, keyed by
//! `{platform}_{bot_id}`. Insertion goes through the DashMap entry API
//! so two concurrent starts of the same bot race for one slot.

use std::collections::BTreeMap;

use botforge_core::types::{BotState, Platform};
use botforge_platform::InboxSender;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Registry key for a bot: `{platform}_{bot_id}`.
pub fn registry_key(platform: Platform, bot_id: i64) -> String {
    format!("{platform}_{bot_id}")
}

/// One running (or parked) bot worker.
#[derive(Clone)]
pub struct RegistryEntry {
    pub bot_id: i64,
    pub name: String,
    pub platform: Platform,
    pub state: BotState,
    pub started_at: DateTime<Utc>,
    pub cancel: CancellationToken,
    /// Identity of the worker task owning this entry; state updates and
    /// removal from a stale worker are ignored.
    pub worker_id: Uuid,
    /// Inbound queue handle for webhook-fed platforms.
    pub inbox: Option<InboxSender>,
}

/// Point-in-time view of the registry for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub startup_complete: bool,
    pub total_active: usize,
    pub bots: BTreeMap<String, BotStatusEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotStatusEntry {
    pub bot_id: i64,
    pub name: String,
    pub platform: Platform,
    pub state: BotState,
    pub started_at: String,
    pub uptime_secs: i64,
}

/// Shared map of running bot workers. Always injected as an `Arc`.
#[derive(Default)]
pub struct BotRegistry {
    bots: DashMap<String, RegistryEntry>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs an entry for a starting worker. Returns `false` when a
    /// live worker already holds the key; an errored or cancelled entry
    /// is replaced.
    pub fn install(&self, key: &str, entry: RegistryEntry) -> bool {
        match self.bots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get();
                if existing.state == BotState::Error || existing.cancel.is_cancelled() {
                    occupied.insert(entry);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                true
            }
        }
    }

    /// State transition from the owning worker; a stale worker id is a
    /// no-op.
    pub fn set_state(&self, key: &str, worker_id: Uuid, state: BotState) {
        if let Some(mut entry) = self.bots.get_mut(key) {
            if entry.worker_id == worker_id {
                entry.state = state;
            }
        }
    }

    /// Removes the entry if it still belongs to `worker_id`.
    pub fn remove_worker(&self, key: &str, worker_id: Uuid) {
        self.bots.remove_if(key, |_, entry| entry.worker_id == worker_id);
    }

    /// Cancels and removes an entry. Returns the removed entry.
    pub fn cancel_and_remove(&self, key: &str) -> Option<RegistryEntry> {
        let (_, entry) = self.bots.remove(key)?;
        entry.cancel.cancel();
        Some(entry)
    }

    /// Registry key for a bot id, whatever its platform.
    pub fn find_key(&self, bot_id: i64) -> Option<String> {
        self.bots
            .iter()
            .find(|entry| entry.value().bot_id == bot_id)
            .map(|entry| entry.key().clone())
    }

    pub fn get(&self, key: &str) -> Option<RegistryEntry> {
        self.bots.get(key).map(|entry| entry.clone())
    }

    /// Inbound queue handle for a webhook-fed bot, if running.
    pub fn inbox_sender(&self, key: &str) -> Option<InboxSender> {
        self.bots.get(key).and_then(|entry| entry.inbox.clone())
    }

    /// Workers currently polling (starting or running).
    pub fn active_count(&self) -> usize {
        self.bots
            .iter()
            .filter(|e| matches!(e.value().state, BotState::Starting | BotState::Running))
            .count()
    }

    pub fn snapshot(&self, startup_complete: bool) -> RegistrySnapshot {
        let now = Utc::now();
        let bots: BTreeMap<String, BotStatusEntry> = self
            .bots
            .iter()
            .map(|entry| {
                let e = entry.value();
                (
                    entry.key().clone(),
                    BotStatusEntry {
                        bot_id: e.bot_id,
                        name: e.name.clone(),
                        platform: e.platform,
                        state: e.state,
                        started_at: e.started_at.to_rfc3339(),
                        uptime_secs: (now - e.started_at).num_seconds().max(0),
                    },
                )
            })
            .collect();
        RegistrySnapshot {
            startup_complete,
            total_active: self.active_count(),
            bots,
        }
    }
}
