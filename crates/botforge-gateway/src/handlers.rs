// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the monitoring gateway.
//!
//! Handles GET /bot-health, GET /api/bot-status, POST /restart-bot/{id}.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use botforge_core::BotforgeError;
use botforge_manager::{BotManager, RegistrySnapshot};

use crate::auth::AuthConfig;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub manager: Arc<BotManager>,
    pub auth: AuthConfig,
    /// Expected `hub.verify_token` for webhook verification handshakes.
    pub webhook_verify_token: Option<String>,
}

/// Response body for GET /bot-health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` once bulk startup finished, `starting` before.
    pub status: &'static str,
    /// Bots with a live polling worker.
    pub active_bots: usize,
    /// All registry entries, errored bots included.
    pub polling_workers: usize,
}

/// Response body for GET /api/bot-status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub snapshot: RegistrySnapshot,
    /// ISO 8601 time the snapshot was taken.
    pub timestamp: String,
    pub version: &'static str,
}

/// Response body for POST /restart-bot/{id}.
#[derive(Debug, Serialize)]
pub struct RestartResponse {
    pub success: bool,
    pub message: String,
    pub bot_id: i64,
    pub platform: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /bot-health
///
/// Unauthenticated liveness check for monitoring systems.
pub async fn get_bot_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let snapshot = state.manager.status();
    Json(HealthResponse {
        status: if snapshot.startup_complete {
            "healthy"
        } else {
            "starting"
        },
        active_bots: snapshot.total_active,
        polling_workers: snapshot.bots.len(),
    })
}

/// GET /api/bot-status
///
/// Full registry snapshot for the admin dashboard.
pub async fn get_bot_status(State(state): State<GatewayState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        snapshot: state.manager.status(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /restart-bot/{id}
///
/// Stops and restarts one bot from a fresh storage read.
pub async fn post_restart_bot(
    State(state): State<GatewayState>,
    Path(bot_id): Path<i64>,
) -> Response {
    match state.manager.restart_bot(bot_id).await {
        Ok(bot) => {
            tracing::info!(bot_id, name = %bot.name, "bot restart initiated via gateway");
            Json(RestartResponse {
                success: true,
                message: format!("Bot {} restart initiated", bot.name),
                bot_id,
                platform: bot.platform.to_string(),
            })
            .into_response()
        }
        Err(BotforgeError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Bot not found".to_string(),
            }),
        )
            .into_response(),
        Err(BotforgeError::Config(message)) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
        }
        Err(e) => {
            tracing::error!(bot_id, error = %e, "bot restart failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
