// Shard Name Source Port
// Looks up the display name of the supervised shard

use std::path::Path;

pub trait ShardNameSource: Send + Sync {
    /// Shard name from the server INI, `None` if unavailable
    fn shard_name(&self, ini_path: &Path) -> Option<String>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Returns a fixed name (or none)
    pub struct MockShardNameSource {
        name: Option<String>,
    }

    impl MockShardNameSource {
        pub fn new(name: Option<&str>) -> Self {
            Self {
                name: name.map(str::to_string),
            }
        }
    }

    impl ShardNameSource for MockShardNameSource {
        fn shard_name(&self, _ini_path: &Path) -> Option<String> {
            self.name.clone()
        }
    }
}
