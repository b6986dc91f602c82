// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams of the Botforge core.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility so
//! adapters can be selected at runtime (platform factory, test mocks).

pub mod platform;
pub mod provider;
pub mod storage;

pub use platform::PlatformAdapter;
pub use provider::AiProvider;
pub use storage::StorageAdapter;
