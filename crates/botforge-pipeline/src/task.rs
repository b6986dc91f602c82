// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation task payloads and enqueue results.

use std::sync::Arc;

use botforge_core::traits::PlatformAdapter;
use botforge_core::types::{Bot, LanguageCode};

/// One queued generation job. Carries the bot snapshot and its adapter
/// so workers never go back to a registry to deliver.
#[derive(Clone)]
pub struct GenerationTask {
    pub task_id: String,
    pub bot: Bot,
    pub adapter: Arc<dyn PlatformAdapter>,
    pub turn_id: i64,
    pub external_user_id: String,
    pub message: String,
    pub prompt: String,
    pub language: LanguageCode,
}

/// Request handed to [`ResponsePipeline::enqueue`].
///
/// [`ResponsePipeline::enqueue`]: crate::ResponsePipeline::enqueue
pub struct EnqueueRequest {
    pub bot: Bot,
    pub adapter: Arc<dyn PlatformAdapter>,
    pub turn_id: i64,
    pub external_user_id: String,
    pub message: String,
    pub prompt: String,
    pub language: LanguageCode,
}

/// What enqueue did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A worker will generate and deliver the reply.
    Queued { task_id: String },
    /// A cached reply for the identical message was delivered directly;
    /// no task was created.
    Memoized { reply: String },
}
