// Status Source Port
// Reads the status artifact the shard rewrites periodically

use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Read the whole artifact
    ///
    /// # Returns
    /// `Ok(None)` when the artifact does not exist (yet)
    ///
    /// # Errors
    /// Any other read failure
    async fn read_status(&self, path: &Path) -> std::io::Result<Option<String>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// What the next read returns
    #[derive(Debug, Clone)]
    pub enum MockStatus {
        Missing,
        Text(String),
        Error(String),
    }

    /// Mock status source with a settable artifact
    #[derive(Clone)]
    pub struct MockStatusSource {
        current: Arc<Mutex<MockStatus>>,
        reads: Arc<Mutex<usize>>,
    }

    impl MockStatusSource {
        pub fn new(status: MockStatus) -> Self {
            Self {
                current: Arc::new(Mutex::new(status)),
                reads: Arc::new(Mutex::new(0)),
            }
        }

        pub fn with_text(text: impl Into<String>) -> Self {
            Self::new(MockStatus::Text(text.into()))
        }

        pub fn set(&self, status: MockStatus) {
            *self.current.lock().unwrap() = status;
        }

        pub fn set_text(&self, text: impl Into<String>) {
            self.set(MockStatus::Text(text.into()));
        }

        pub fn read_count(&self) -> usize {
            *self.reads.lock().unwrap()
        }
    }

    #[async_trait]
    impl StatusSource for MockStatusSource {
        async fn read_status(&self, _path: &Path) -> std::io::Result<Option<String>> {
            *self.reads.lock().unwrap() += 1;
            match self.current.lock().unwrap().clone() {
                MockStatus::Missing => Ok(None),
                MockStatus::Text(text) => Ok(Some(text)),
                MockStatus::Error(msg) => Err(std::io::Error::new(std::io::ErrorKind::Other, msg)),
            }
        }
    }
}
