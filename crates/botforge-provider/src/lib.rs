// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider adapter for the Botforge platform.
//!
//! Implements [`botforge_core::AiProvider`] over the generateContent REST
//! API and carries the canned localized replies used when generation is
//! skipped or fails.

pub mod gemini;
pub mod replies;
pub mod types;

pub use gemini::{GeminiProvider, tidy_reply};
pub use replies::{expired_reply, fallback_reply, rate_limited_reply};
