// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph API webhook ingestion for the webhook-fed platforms.
//!
//! WhatsApp and Instagram deliver inbound messages by webhook. The GET
//! route answers Meta's `hub.verify_token`/`hub.challenge` handshake;
//! the POST route parses the delivery into normalized messages and
//! pushes them into the running bot's inbox, where its polling worker
//! picks them up. Deliveries are acknowledged with 200 even when the
//! bot has no running worker, since Meta retries non-2xx responses.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use botforge_core::Platform;
use botforge_manager::registry_key;
use tracing::{debug, info, warn};

use crate::handlers::GatewayState;

/// GET /webhook/{platform}/{bot_id}
///
/// Webhook verification handshake. Echoes `hub.challenge` when the
/// presented `hub.verify_token` matches the configured one.
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Path((platform, bot_id)): Path<(String, i64)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if Platform::from_str(&platform).is_err() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let presented = params.get("hub.verify_token");
    let challenge = params.get("hub.challenge");
    match (&state.webhook_verify_token, presented, challenge) {
        (Some(expected), Some(token), Some(challenge)) if token == expected => {
            info!(platform = %platform, bot_id, "webhook verified");
            challenge.clone().into_response()
        }
        _ => {
            warn!(platform = %platform, bot_id, "webhook verification failed");
            (StatusCode::FORBIDDEN, "Verification failed").into_response()
        }
    }
}

/// POST /webhook/{platform}/{bot_id}
///
/// Inbound message delivery. Parses the Graph payload and feeds the
/// bot's inbox.
pub async fn receive_webhook(
    State(state): State<GatewayState>,
    Path((platform, bot_id)): Path<(String, i64)>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let Ok(platform) = Platform::from_str(&platform) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let batch = match platform {
        Platform::WhatsApp => botforge_platform::whatsapp::parse_webhook(&payload),
        Platform::Instagram => botforge_platform::instagram::parse_webhook(&payload),
        // Telegram ingests by long poll; nothing arrives here.
        Platform::Telegram => Vec::new(),
    };

    let key = registry_key(platform, bot_id);
    match state.manager.registry().inbox_sender(&key) {
        Some(sender) => {
            debug!(key = %key, count = batch.len(), "webhook delivery queued");
            for message in batch {
                sender.push(message);
            }
        }
        None => {
            debug!(key = %key, "webhook delivery for bot without a running worker");
        }
    }
    "OK".into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use botforge_cache::MemoryCache;
    use botforge_config::{
        CacheConfig, ContextConfig, ManagerConfig, PipelineConfig, RateLimitConfig,
    };
    use botforge_context::ContextAssembler;
    use botforge_core::types::{
        Bot, Entitlement, LanguageCode, Platform, PlatformCredential, Tier,
    };
    use botforge_dispatch::Dispatcher;
    use botforge_manager::{AdapterFactory, BotManager, BotRegistry};
    use botforge_pipeline::ResponsePipeline;
    use botforge_platform::{AdapterHandle, WhatsAppAdapter};
    use botforge_test_utils::{MemoryStorage, MockProvider};
    use http_body_util::BodyExt;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::AuthConfig;
    use crate::handlers::GatewayState;
    use crate::server::build_router;

    fn whatsapp_bot() -> Bot {
        Bot {
            id: 1,
            owner_id: 1,
            name: "Do'kon Bot".to_string(),
            platform: Platform::WhatsApp,
            credential: PlatformCredential {
                token: "wa-token".to_string(),
                endpoint_id: Some("9001".to_string()),
            },
            active: true,
            admin_chat_id: None,
            notifications_enabled: false,
            created_at: "2026-08-01 10:00:00".to_string(),
        }
    }

    async fn manager_with_factory(factory: AdapterFactory) -> Arc<BotManager> {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_bot(whatsapp_bot()).await;
        storage
            .set_entitlement(
                1,
                Entitlement {
                    tier: Tier::Free,
                    expires_at: None,
                    language: LanguageCode::Uz,
                },
            )
            .await;

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
        let manager_config = ManagerConfig {
            restart_max_attempts: 3,
            restart_backoff_secs: 5,
            startup_stagger_ms: 0,
            poll_timeout_secs: 1,
        };
        Arc::new(
            BotManager::new(
                storage,
                cache,
                assembler,
                pipeline,
                Arc::new(BotRegistry::new()),
                &manager_config,
                &cache_config,
                cancel,
            )
            .with_adapter_factory(factory),
        )
    }

    fn router(manager: Arc<BotManager>, verify_token: Option<&str>) -> axum::Router {
        build_router(GatewayState {
            manager,
            auth: AuthConfig { bearer_token: None },
            webhook_verify_token: verify_token.map(str::to_string),
        })
    }

    fn inbound_text_payload() -> serde_json::Value {
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": "998901234567",
                            "id": "wamid.e2e",
                            "type": "text",
                            "text": {"body": "salom"},
                        }],
                    },
                }],
            }],
        })
    }

    #[tokio::test]
    async fn verification_echoes_challenge_for_matching_token() {
        let manager = manager_with_factory(Arc::new(|bot: &Bot| {
            let adapter = WhatsAppAdapter::new(
                &bot.credential.token,
                bot.credential.endpoint_id.as_deref().unwrap_or_default(),
            )?;
            let inbox = adapter.inbox_sender();
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                inbox: Some(inbox),
            })
        }))
        .await;
        let app = router(manager, Some("vrfy-123"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/webhook/whatsapp/1?hub.mode=subscribe&hub.verify_token=vrfy-123&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], &b"42"[..]);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook/whatsapp/1?hub.verify_token=wrong&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn verification_fails_without_configured_token() {
        let manager = manager_with_factory(Arc::new(|_bot: &Bot| {
            let adapter = WhatsAppAdapter::new("wa-token", "9001")?;
            let inbox = adapter.inbox_sender();
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                inbox: Some(inbox),
            })
        }))
        .await;
        let app = router(manager, None);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook/whatsapp/1?hub.verify_token=anything&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_platform_segment_is_404() {
        let manager = manager_with_factory(Arc::new(|_bot: &Bot| {
            let adapter = WhatsAppAdapter::new("wa-token", "9001")?;
            let inbox = adapter.inbox_sender();
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                inbox: Some(inbox),
            })
        }))
        .await;
        let app = router(manager, None);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/viber/1")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delivery_for_stopped_bot_is_still_acknowledged() {
        let manager = manager_with_factory(Arc::new(|_bot: &Bot| {
            let adapter = WhatsAppAdapter::new("wa-token", "9001")?;
            let inbox = adapter.inbox_sender();
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                inbox: Some(inbox),
            })
        }))
        .await;
        let app = router(manager, None);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/whatsapp/1")
                    .header("content-type", "application/json")
                    .body(Body::from(inbound_text_payload().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn whatsapp_delivery_flows_webhook_to_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/9001/messages"))
            .and(body_partial_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "to": "998901234567",
                "type": "text",
                "text": {"body": "mock reply"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let base_url = server.uri();
        let manager = manager_with_factory(Arc::new(move |bot: &Bot| {
            let adapter = WhatsAppAdapter::new(
                &bot.credential.token,
                bot.credential.endpoint_id.as_deref().unwrap_or_default(),
            )?
            .with_base_url(base_url.clone());
            let inbox = adapter.inbox_sender();
            Ok(AdapterHandle {
                adapter: Arc::new(adapter),
                inbox: Some(inbox),
            })
        }))
        .await;
        manager.start_bot(1).await.unwrap();
        let app = router(manager, None);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/whatsapp/1")
                    .header("content-type", "application/json")
                    .body(Body::from(inbound_text_payload().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        for _ in 0..500 {
            if !server.received_requests().await.unwrap_or_default().is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reply never reached the Cloud API endpoint");
    }
}
