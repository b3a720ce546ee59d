// Notifier - best-effort multi-sink alerts
// Event log always, webhook when configured; failures never reach the caller

use crate::port::{AlertSink, EventLog};
use std::sync::Arc;
use tracing::{debug, warn};

/// Remote alert settings (read-only view of the operator config)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertSettings {
    pub enabled: bool,
    pub endpoint: String,
}

impl AlertSettings {
    pub fn new(enabled: bool, endpoint: impl Into<String>) -> Self {
        Self {
            enabled,
            endpoint: endpoint.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    fn endpoint(&self) -> Option<&str> {
        let endpoint = self.endpoint.trim();
        (self.enabled && !endpoint.is_empty()).then_some(endpoint)
    }
}

/// Fans a message out to the event log and the alert sink
pub struct Notifier {
    event_log: Arc<dyn EventLog>,
    alert_sink: Arc<dyn AlertSink>,
    settings: AlertSettings,
}

impl Notifier {
    pub fn new(
        event_log: Arc<dyn EventLog>,
        alert_sink: Arc<dyn AlertSink>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            event_log,
            alert_sink,
            settings,
        }
    }

    /// Record a line in the event log only
    pub async fn log(&self, message: &str) {
        if let Err(e) = self.event_log.append(message).await {
            warn!(error = %e, "Failed to append to event log");
        }
    }

    /// Log `message` and push it to the webhook when enabled
    ///
    /// Waits for the single delivery attempt; its failure is logged and dropped.
    pub async fn notify(&self, message: &str) {
        self.log(message).await;

        let Some(endpoint) = self.settings.endpoint() else {
            debug!("Remote alerting disabled, alert logged only");
            return;
        };

        if let Err(e) = self.alert_sink.deliver(endpoint, message).await {
            warn!(error = %e, "Alert delivery failed");
            self.log(&format!("Failed to send webhook alert: {}", e))
                .await;
        }
    }
}
