// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `botforge status` command implementation.
//!
//! Connects to the gateway health endpoint to display platform state.
//! Falls back gracefully when the service is not running.

use std::time::Duration;

use botforge_config::BotforgeConfig;
use botforge_core::BotforgeError;
use serde::{Deserialize, Serialize};

/// Health endpoint response from the gateway.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    active_bots: usize,
    polling_workers: usize,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub active_bots: Option<usize>,
    pub polling_workers: Option<usize>,
    pub gateway_host: String,
    pub gateway_port: u16,
}

/// Run the `botforge status` command.
///
/// Connects to the health endpoint on the gateway. If `--json` is
/// passed, outputs structured JSON for scripting.
pub async fn run_status(config: &BotforgeConfig, json: bool) -> Result<(), BotforgeError> {
    let host = &config.gateway.host;
    let port = config.gateway.port;
    let url = format!("http://{host}:{port}/bot-health");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| BotforgeError::Internal(format!("failed to create HTTP client: {e}")))?;

    let result = client.get(&url).send().await;

    match result {
        Ok(resp) if resp.status().is_success() => {
            let health: HealthResponse = resp.json().await.map_err(|e| {
                BotforgeError::Internal(format!("failed to parse health response: {e}"))
            })?;

            if json {
                let status_resp = StatusResponse {
                    running: true,
                    status: health.status.clone(),
                    active_bots: Some(health.active_bots),
                    polling_workers: Some(health.polling_workers),
                    gateway_host: host.clone(),
                    gateway_port: port,
                };
                println!(
                    "{}",
                    serde_json::to_string_pretty(&status_resp)
                        .unwrap_or_else(|_| "{}".to_string())
                );
            } else {
                println!("botforge is {}", health.status);
                println!("  active bots:     {}", health.active_bots);
                println!("  polling workers: {}", health.polling_workers);
                println!("  gateway:         {host}:{port}");
            }
        }
        _ => {
            if json {
                let status_resp = StatusResponse {
                    running: false,
                    status: "not running".to_string(),
                    active_bots: None,
                    polling_workers: None,
                    gateway_host: host.clone(),
                    gateway_port: port,
                };
                println!(
                    "{}",
                    serde_json::to_string_pretty(&status_resp)
                        .unwrap_or_else(|_| "{}".to_string())
                );
            } else {
                println!("botforge is not running");
                println!("  no gateway at {host}:{port}");
                println!("  start it with: botforge serve");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_deserializes() {
        let health: HealthResponse = serde_json::from_str(
            r#"{"status":"healthy","active_bots":3,"polling_workers":3}"#,
        )
        .unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.active_bots, 3);
        assert_eq!(health.polling_workers, 3);
    }
}
