// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock AI provider for deterministic testing.
//!
//! `MockProvider` implements `AiProvider` with a scripted queue of
//! outcomes, so retry and fallback paths can be exercised without
//! external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use botforge_core::{AiProvider, BotforgeError, LanguageCode};

/// One scripted generation outcome.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Succeed with this reply.
    Reply(String),
    /// Fail with a transient error (retryable).
    Transient,
    /// Fail with a terminal provider error.
    Terminal,
}

/// A mock provider that pops outcomes from a FIFO script.
///
/// When the script is empty, generation succeeds with "mock reply".
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a mock provider with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock provider pre-loaded with the given outcomes.
    pub fn with_script(outcomes: Vec<Outcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(outcomes))),
            calls: AtomicUsize::new(0),
        }
    }

    /// Append an outcome to the script.
    pub async fn push_outcome(&self, outcome: Outcome) {
        self.script.lock().await.push_back(outcome);
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    async fn generate(
        &self,
        _prompt: &str,
        _language: LanguageCode,
    ) -> Result<String, BotforgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Outcome::Reply("mock reply".to_string()));
        match outcome {
            Outcome::Reply(text) => Ok(text),
            Outcome::Transient => Err(BotforgeError::Transient {
                message: "mock transient failure".to_string(),
                source: None,
            }),
            Outcome::Terminal => Err(BotforgeError::Provider {
                message: "mock terminal failure".to_string(),
                source: None,
            }),
        }
    }
}
