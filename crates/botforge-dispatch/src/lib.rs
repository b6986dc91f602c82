// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery and notification dispatch for the Botforge platform.
//!
//! Takes a generated reply, persists it onto its conversation turn
//! (write-once), re-validates the bot against storage, sends the reply
//! through the bot's platform adapter, and fans out an optional
//! redacted admin notification.

pub mod dispatcher;
pub mod notify;

pub use dispatcher::{DeliveryOutcome, Dispatcher};
