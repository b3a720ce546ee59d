// Application Layer - Use Cases and Business Logic

pub mod controller;
pub mod notifier;
pub mod restart;
pub mod status_poller;
pub mod supervisor;

// Re-exports
pub use controller::{MonitorController, MonitorHandle, MonitorPorts, MonitorStatus};
pub use notifier::{AlertSettings, Notifier};
pub use restart::{RestartDecision, RestartPolicy};
pub use status_poller::{PollOutcome, PollSettings, StatusPoller};
pub use supervisor::{shutdown_channel, ShutdownSender, ShutdownToken, StopMode, Supervisor};
