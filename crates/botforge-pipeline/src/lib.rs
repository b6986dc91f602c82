// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous response pipeline for the Botforge platform.
//!
//! Inbound messages become generation tasks on a bounded queue; a fixed
//! worker pool runs the AI provider with per-attempt timeouts and
//! exponential backoff, memoizes successful replies, and routes every
//! outcome (reply or fallback) through the dispatcher.

pub mod pipeline;
pub mod retry;
pub mod task;

pub use pipeline::ResponsePipeline;
pub use retry::RetryPolicy;
pub use task::{EnqueueOutcome, EnqueueRequest, GenerationTask};
