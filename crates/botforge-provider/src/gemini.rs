// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini generateContent API.
//!
//! One request per generation attempt. Retry and timeout policy live in the
//! response pipeline, so this client only classifies failures: HTTP 429 and
//! 5xx map to [`BotforgeError::Transient`], everything else is terminal.

use async_trait::async_trait;
use botforge_config::GeminiConfig;
use botforge_core::{AiProvider, BotforgeError, LanguageCode};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, GenerateRequest, GenerateResponse};

/// Base URL for the Gemini API.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini-backed [`AiProvider`].
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    model: String,
    max_reply_chars: usize,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new Gemini client from configuration.
    ///
    /// Fails when no API key is configured or the key is not a valid
    /// header value.
    pub fn new(config: &GeminiConfig) -> Result<Self, BotforgeError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| BotforgeError::Config("gemini.api_key is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| BotforgeError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BotforgeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model: config.model.clone(),
            max_reply_chars: config.max_reply_chars,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        _language: LanguageCode,
    ) -> Result<String, BotforgeError> {
        let request = GenerateRequest::from_prompt(prompt);

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    BotforgeError::Transient {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                } else {
                    BotforgeError::Provider {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "generation response received");

        if status.is_success() {
            let body = response.text().await.map_err(|e| BotforgeError::Provider {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;
            let parsed: GenerateResponse =
                serde_json::from_str(&body).map_err(|e| BotforgeError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                })?;
            let text = parsed.first_text().ok_or_else(|| BotforgeError::Provider {
                message: "API returned no candidate text".to_string(),
                source: None,
            })?;
            return Ok(tidy_reply(&text, self.max_reply_chars));
        }

        let body = response.text().await.unwrap_or_default();
        let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
            format!(
                "Gemini API error ({}): {}",
                api_err.error.status, api_err.error.message
            )
        } else {
            format!("API returned {status}: {body}")
        };

        if status.as_u16() == 429 || status.is_server_error() {
            Err(BotforgeError::Transient {
                message,
                source: None,
            })
        } else {
            Err(BotforgeError::Provider {
                message,
                source: None,
            })
        }
    }
}

/// Strips markdown emphasis markers and caps the reply length.
///
/// Bots speak plain text on every platform, so `**`, `*`, and backticks
/// are removed. Replies over `max_chars` are cut at a char boundary with
/// a trailing ellipsis.
pub fn tidy_reply(raw: &str, max_chars: usize) -> String {
    let cleaned: String = raw
        .replace("**", "")
        .chars()
        .filter(|c| *c != '*' && *c != '`')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.chars().count() > max_chars {
        let cut: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> GeminiConfig {
        GeminiConfig {
            api_key: Some("test-key".to_string()),
            model: "gemini-2.5-flash".to_string(),
            max_reply_chars: 4000,
        }
    }

    fn test_provider(base_url: &str) -> GeminiProvider {
        GeminiProvider::new(&test_config())
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn success_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]}
            }]
        })
    }

    #[test]
    fn new_requires_api_key() {
        let config = GeminiConfig {
            api_key: None,
            ..test_config()
        };
        assert!(GeminiProvider::new(&config).is_err());
    }

    #[tokio::test]
    async fn generate_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Salom! \u{1f44b}")))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let reply = provider.generate("salom", LanguageCode::Uz).await.unwrap();
        assert_eq!(reply, "Salom! \u{1f44b}");
    }

    #[tokio::test]
    async fn generate_strips_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(success_body("**Narxi** `150000` *som*")),
            )
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let reply = provider.generate("narxi?", LanguageCode::Uz).await.unwrap();
        assert_eq!(reply, "Narxi 150000 som");
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"code": 503, "message": "overloaded", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let err = provider.generate("hi", LanguageCode::En).await.unwrap_err();
        assert!(err.is_transient(), "503 should be transient: {err}");
    }

    #[tokio::test]
    async fn rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let err = provider.generate("hi", LanguageCode::En).await.unwrap_err();
        assert!(err.is_transient(), "429 should be transient: {err}");
    }

    #[tokio::test]
    async fn client_errors_are_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "bad request", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let err = provider.generate("hi", LanguageCode::En).await.unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("INVALID_ARGUMENT"), "got: {err}");
    }

    #[tokio::test]
    async fn empty_candidates_are_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        assert!(provider.generate("hi", LanguageCode::En).await.is_err());
    }

    #[test]
    fn tidy_reply_truncates_long_text() {
        let long = "a".repeat(50);
        let tidied = tidy_reply(&long, 10);
        assert_eq!(tidied, format!("{}...", "a".repeat(10)));
    }

    #[test]
    fn tidy_reply_respects_char_boundaries() {
        let text = "са\u{043b}ом дунё";
        let tidied = tidy_reply(text, 5);
        assert!(tidied.ends_with("..."));
        assert_eq!(tidied.chars().count(), 8);
    }
}
