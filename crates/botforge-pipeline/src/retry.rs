// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff policy for failed generation attempts.

use std::time::Duration;

use botforge_config::PipelineConfig;

/// Backoff schedule: `base_delay * 2^attempt` after attempt 0, 1, 2, ...
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(config.backoff_base_secs),
        }
    }

    /// Delay before re-running a task that just failed its
    /// `attempt`-th try (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Total attempts a task gets, the initial one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}
