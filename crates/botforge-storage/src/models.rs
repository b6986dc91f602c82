// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage entity types.
//!
//! The row shapes are the shared domain types from `botforge-core`; this
//! module re-exports them so query modules and downstream crates have one
//! import path for persisted entities.

pub use botforge_core::{
    Bot, ConversationTurn, Entitlement, KnowledgeEntry, KnowledgeKind, LanguageCode, NewTurn,
    Platform, PlatformCredential, TaskRecord, TaskStatus, Tier,
};
