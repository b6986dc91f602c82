// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key/value cache with per-key TTL.
//!
//! Backs four concerns of the core: knowledge-base snapshots, per-user
//! context, fixed-window rate-limit counters, and memoized AI responses.
//! An expired entry is never returned; callers see a miss and recompute.
//!
//! The cache is the only state mutated by multiple workers concurrently,
//! so counters increment atomically (DashMap entry API holds the shard
//! lock) and snapshot population is single-flight per key.

pub mod keys;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use botforge_core::BotforgeError;

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Shared in-memory cache. Cheap to clone (`Arc` inside).
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, Slot>>,
    /// Per-key populate guards for [`get_or_populate`](Self::get_or_populate).
    populate_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, or `None` on miss or expiry.
    /// Expired entries are evicted on read.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(slot) if slot.expired(now) => true,
            Some(slot) => {
                debug!(key, "cache hit");
                return Some(slot.value.clone());
            }
            None => return None,
        };
        if expired {
            self.entries.remove(key);
        }
        debug!(key, "cache miss");
        None
    }

    /// Stores `value` under `key`. `None` TTL means the entry never expires.
    pub fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let slot = Slot {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(key.to_string(), slot);
    }

    /// Removes `key` if present.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Atomically increments the fixed-window counter under `key` and
    /// returns the new count.
    ///
    /// The window starts when the counter is created (count transitions to 1)
    /// or when an expired counter is reset; increments inside the window do
    /// not extend it.
    pub fn incr(&self, key: &str, window: Duration) -> u64 {
        let now = Instant::now();
        let mut slot = self.entries.entry(key.to_string()).or_insert_with(|| Slot {
            value: "0".to_string(),
            expires_at: Some(now + window),
        });
        if slot.expired(now) {
            slot.value = "0".to_string();
            slot.expires_at = Some(now + window);
        }
        let count = slot.value.parse::<u64>().unwrap_or(0) + 1;
        slot.value = count.to_string();
        count
    }

    /// Returns the value for `key`, populating it from `compute` on a miss.
    ///
    /// Population is single-flight: concurrent misses for the same key wait
    /// on a per-key guard and the late arrivals re-check the cache instead
    /// of recomputing. A failed computation populates nothing.
    pub async fn get_or_populate<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<String, BotforgeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, BotforgeError>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let guard = self
            .populate_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _held = guard.lock().await;

        // Another task may have populated while we waited on the guard.
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = compute().await?;
        self.set(key, &value, Some(ttl));
        debug!(key, "cache populated");
        Ok(value)
    }

    /// Number of live (possibly expired-but-unevicted) entries; for status
    /// reporting only.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
