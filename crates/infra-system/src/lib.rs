// Shardmon Infrastructure - System Adapters
// Implements: ProcessLauncher, single-instance lock

pub mod instance_lock;
pub mod process_launcher;

pub use instance_lock::InstanceLock;
pub use process_launcher::{TokioChild, TokioProcessLauncher};
