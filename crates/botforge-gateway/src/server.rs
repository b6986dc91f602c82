// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use botforge_config::GatewayConfig;
use botforge_core::BotforgeError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::auth::auth_middleware;
use crate::handlers::{self, GatewayState};
use crate::webhook;

/// Builds the gateway router:
/// - GET /bot-health (unauthenticated)
/// - GET+POST /webhook/{platform}/{bot_id} (Graph handshake + delivery)
/// - GET /api/bot-status (bearer auth when configured)
/// - POST /restart-bot/{id} (bearer auth when configured)
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/bot-health", get(handlers::get_bot_health))
        .route(
            "/webhook/{platform}/{bot_id}",
            get(webhook::verify_webhook).post(webhook::receive_webhook),
        )
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/api/bot-status", get(handlers::get_bot_status))
        .route("/restart-bot/{id}", post(handlers::post_restart_bot))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
}

/// Binds the gateway and serves it until `cancel` fires.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), BotforgeError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BotforgeError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| BotforgeError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use botforge_cache::MemoryCache;
    use botforge_config::{CacheConfig, ContextConfig, ManagerConfig, PipelineConfig, RateLimitConfig};
    use botforge_context::ContextAssembler;
    use botforge_core::types::{Bot, Platform, PlatformCredential};
    use botforge_dispatch::Dispatcher;
    use botforge_manager::{BotManager, BotRegistry};
    use botforge_pipeline::ResponsePipeline;
    use botforge_platform::AdapterHandle;
    use botforge_test_utils::{MemoryStorage, MockPlatform, MockProvider};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::auth::AuthConfig;

    fn test_bot(id: i64, active: bool) -> Bot {
        Bot {
            id,
            owner_id: 1,
            name: format!("bot-{id}"),
            platform: Platform::Telegram,
            credential: PlatformCredential {
                token: "123:abc".to_string(),
                endpoint_id: None,
            },
            active,
            admin_chat_id: None,
            notifications_enabled: false,
            created_at: "2026-08-01 10:00:00".to_string(),
        }
    }

    async fn manager() -> Arc<BotManager> {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_bot(test_bot(1, true)).await;
        storage.add_bot(test_bot(2, false)).await;

        let cache = Arc::new(MemoryCache::new());
        let cache_config = CacheConfig {
            kb_ttl_secs: 1800,
            user_ttl_secs: 300,
            response_ttl_secs: 3600,
        };
        let assembler = Arc::new(ContextAssembler::new(
            storage.clone(),
            cache.clone(),
            &ContextConfig::default(),
            Duration::from_secs(cache_config.kb_ttl_secs),
        ));
        let cancel = CancellationToken::new();
        let (pipeline, _handles) = ResponsePipeline::start(
            storage.clone(),
            Arc::new(MockProvider::new()),
            cache.clone(),
            Arc::new(Dispatcher::new(storage.clone())),
            &PipelineConfig::default(),
            &RateLimitConfig {
                limit: 5,
                window_secs: 60,
            },
            &cache_config,
            cancel.clone(),
        );
        Arc::new(
            BotManager::new(
                storage,
                cache,
                assembler,
                pipeline,
                Arc::new(BotRegistry::new()),
                &ManagerConfig::default(),
                &cache_config,
                cancel,
            )
            .with_adapter_factory(Arc::new(|bot: &Bot| {
                Ok(AdapterHandle {
                    adapter: Arc::new(MockPlatform::new(bot.platform)),
                    inbox: None,
                })
            })),
        )
    }

    fn router(manager: Arc<BotManager>, bearer_token: Option<&str>) -> Router {
        build_router(GatewayState {
            manager,
            auth: AuthConfig {
                bearer_token: bearer_token.map(str::to_string),
            },
            webhook_verify_token: None,
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_starting_before_startup_completes() {
        let app = router(manager().await, None);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/bot-health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "starting");
        assert_eq!(json["active_bots"], 0);
    }

    #[tokio::test]
    async fn health_reports_healthy_with_running_workers() {
        let m = manager().await;
        m.start_all_active().await;
        let app = router(m, None);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/bot-health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["active_bots"], 1);
        assert_eq!(json["polling_workers"], 1);
    }

    #[tokio::test]
    async fn status_requires_bearer_token_when_configured() {
        let app = router(manager().await, Some("sekret"));
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/bot-status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/bot-status")
                    .header("authorization", "Bearer sekret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["timestamp"].is_string());
        assert!(json["bots"].is_object());
    }

    #[tokio::test]
    async fn restart_unknown_bot_is_404_and_inactive_is_400() {
        let app = router(manager().await, None);
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/restart-bot/99")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/restart-bot/2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn restart_running_bot_succeeds() {
        let m = manager().await;
        m.start_all_active().await;
        let app = router(m, None);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/restart-bot/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["bot_id"], 1);
        assert_eq!(json["platform"], "telegram");
    }
}
