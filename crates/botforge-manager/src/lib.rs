// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot lifecycle management for the Botforge platform.
//!
//! One supervised polling worker per active bot, tracked in a shared
//! registry the gateway reads for health and status. Workers gate
//! messages on tenant entitlement and per-user rate limits before
//! handing generation to the response pipeline.

pub mod manager;
pub mod registry;

pub use manager::{AdapterFactory, BotManager, StartOutcome};
pub use registry::{BotRegistry, BotStatusEntry, RegistryEntry, RegistrySnapshot, registry_key};
