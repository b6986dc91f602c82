// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Monitoring and admin HTTP gateway for the Botforge platform.
//!
//! Serves a public liveness endpoint, Graph API webhook ingestion for
//! the webhook-fed platforms, and bearer-protected status and restart
//! endpoints backed by the bot lifecycle manager's registry.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod webhook;

pub use auth::AuthConfig;
pub use handlers::GatewayState;
pub use server::{build_router, start_server};
