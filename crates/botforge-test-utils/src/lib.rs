// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Botforge integration tests.
//!
//! Provides mock adapters and an in-memory storage backend for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock AI provider with a scripted outcome queue
//! - [`MockPlatform`] - Mock messaging platform with message injection and capture
//! - [`MemoryStorage`] - In-memory `StorageAdapter` implementation

pub mod memory_storage;
pub mod mock_platform;
pub mod mock_provider;

pub use memory_storage::MemoryStorage;
pub use mock_platform::{MockPlatform, SentMessage};
pub use mock_provider::{MockProvider, Outcome};
