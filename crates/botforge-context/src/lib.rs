// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt context assembly for the Botforge platform.
//!
//! Turns a bot's knowledge base, the user's recent conversation turns,
//! and a language-specific system prompt into the single prompt string
//! the AI provider consumes. Knowledge snapshots are cached; price lines
//! are pinned when the snapshot must be truncated.

pub mod assembler;
pub mod price;
pub mod prompt;

pub use assembler::ContextAssembler;
pub use price::{is_price_line, squeeze};
pub use prompt::{PromptContext, system_prompt};
