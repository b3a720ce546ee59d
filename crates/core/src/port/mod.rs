// Port Layer - Interfaces for external collaborators

pub mod alert_sink;
pub mod config_store;
pub mod event_log;
pub mod process;
pub mod shard_source;
pub mod status_source;

// Re-exports
pub use alert_sink::{AlertError, AlertSink};
pub use config_store::ConfigStore;
pub use event_log::EventLog;
pub use process::{ChildProcess, ProcessError, ProcessLauncher};
pub use shard_source::ShardNameSource;
pub use status_source::StatusSource;
