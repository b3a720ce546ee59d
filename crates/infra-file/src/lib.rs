// Shardmon Infrastructure - File Adapters
// Implements: ConfigStore, EventLog, StatusSource, ShardNameSource

pub mod config_store;
pub mod event_log;
pub mod shard_source;
pub mod status_source;

pub use config_store::FileConfigStore;
pub use event_log::FileEventLog;
pub use shard_source::IniShardNameSource;
pub use status_source::FileStatusSource;
