// Alert Sink Port
// Remote alert delivery (webhook)

use async_trait::async_trait;
use thiserror::Error;

/// Alert delivery errors
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint rejected alert with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Remote alert sink
///
/// One call = one delivery attempt. Callers never retry.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver `message` to `endpoint`
    ///
    /// # Errors
    /// - AlertError::Transport on network failure or timeout
    /// - AlertError::Rejected on a non-2xx response
    async fn deliver(&self, endpoint: &str, message: &str) -> Result<(), AlertError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records deliveries; optionally fails every one of them
    #[derive(Clone, Default)]
    pub struct MockAlertSink {
        delivered: Arc<Mutex<Vec<(String, String)>>>,
        fail: bool,
    }

    impl MockAlertSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Messages delivered so far (attempts included when failing)
        pub fn messages(&self) -> Vec<String> {
            self.delivered
                .lock()
                .unwrap()
                .iter()
                .map(|(_, message)| message.clone())
                .collect()
        }

        pub fn endpoints(&self) -> Vec<String> {
            self.delivered
                .lock()
                .unwrap()
                .iter()
                .map(|(endpoint, _)| endpoint.clone())
                .collect()
        }

        pub fn count_containing(&self, needle: &str) -> usize {
            self.messages().iter().filter(|m| m.contains(needle)).count()
        }
    }

    #[async_trait]
    impl AlertSink for MockAlertSink {
        async fn deliver(&self, endpoint: &str, message: &str) -> Result<(), AlertError> {
            self.delivered
                .lock()
                .unwrap()
                .push((endpoint.to_string(), message.to_string()));

            if self.fail {
                return Err(AlertError::Rejected {
                    status: 500,
                    body: "mock failure".to_string(),
                });
            }
            Ok(())
        }
    }
}
