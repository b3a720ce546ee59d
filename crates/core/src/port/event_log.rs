// Event Log Port
// Durable, append-only operator log (one timestamped line per record)

use async_trait::async_trait;

#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append one record; the implementation adds the timestamp
    async fn append(&self, message: &str) -> std::io::Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory event log
    #[derive(Clone, Default)]
    pub struct MockEventLog {
        lines: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl MockEventLog {
        pub fn new() -> Self {
            Self::default()
        }

        /// Log whose every append fails (disk full, permissions...)
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.lines().iter().any(|line| line.contains(needle))
        }
    }

    #[async_trait]
    impl EventLog for MockEventLog {
        async fn append(&self, message: &str) -> std::io::Result<()> {
            if self.fail {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "mock event log is read-only",
                ));
            }
            self.lines.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }
}
