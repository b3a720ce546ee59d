// Domain Layer - Pure monitoring logic and entities

pub mod config;
pub mod error;
pub mod shard;
pub mod status;
pub mod supervision;

// Re-exports
pub use config::{MonitorConfig, PathSetting, MIN_STATUS_INTERVAL_SECS};
pub use error::DomainError;
pub use shard::{parse_server_name, DEFAULT_SHARD_NAME};
pub use status::{extract_count, StatusLabels, StatusSnapshot, UNKNOWN_COUNT};
pub use supervision::{ExitOutcome, SupervisionOutcome, SupervisionState, SupervisorPhase};
