// Config Store Port
// Persistence of the operator configuration

use crate::domain::MonitorConfig;
use crate::error::Result;

pub trait ConfigStore: Send + Sync {
    /// Whether a saved configuration exists (first run otherwise)
    fn exists(&self) -> bool;

    /// Load the saved configuration
    ///
    /// # Errors
    /// - AppError::ConfigMissing if nothing was saved yet
    /// - AppError::Io on read failure
    fn load(&self) -> Result<MonitorConfig>;

    /// Persist the configuration, replacing the previous one
    fn save(&self, config: &MonitorConfig) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// In-memory config store
    #[derive(Clone, Default)]
    pub struct MockConfigStore {
        saved: Arc<Mutex<Option<MonitorConfig>>>,
    }

    impl MockConfigStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_config(config: MonitorConfig) -> Self {
            Self {
                saved: Arc::new(Mutex::new(Some(config))),
            }
        }

        pub fn saved(&self) -> Option<MonitorConfig> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl ConfigStore for MockConfigStore {
        fn exists(&self) -> bool {
            self.saved.lock().unwrap().is_some()
        }

        fn load(&self) -> Result<MonitorConfig> {
            self.saved()
                .ok_or_else(|| AppError::ConfigMissing(PathBuf::from("mock")))
        }

        fn save(&self, config: &MonitorConfig) -> Result<()> {
            *self.saved.lock().unwrap() = Some(config.clone());
            Ok(())
        }
    }
}
