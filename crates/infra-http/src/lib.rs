// Shardmon Infrastructure - HTTP Adapters
// Implements: AlertSink (Discord-compatible webhook)

pub mod webhook;

pub use webhook::{WebhookAlertSink, WebhookPayload, DEFAULT_WEBHOOK_TIMEOUT};
