// Webhook AlertSink Implementation
// One JSON POST per alert, {"content": "<message>"}; no retries

use async_trait::async_trait;
use serde::Serialize;
use shardmon_core::port::{AlertError, AlertSink};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound for one delivery so a dead endpoint cannot stall the caller
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire body accepted by Discord-style webhooks
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub content: &'a str,
}

pub struct WebhookAlertSink {
    client: reqwest::Client,
}

impl WebhookAlertSink {
    /// Create a sink with a per-request timeout
    ///
    /// # Errors
    /// - AlertError::Transport if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlertError::Transport(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn deliver(&self, endpoint: &str, message: &str) -> Result<(), AlertError> {
        debug!(len = message.len(), "Posting webhook alert");

        let response = self
            .client
            .post(endpoint)
            .json(&WebhookPayload { content: message })
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(status = status.as_u16(), "Webhook alert sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "Webhook rejected alert");
        Err(AlertError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
