// Central Error Type for the Application

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Config file not found: {}", .0.display())]
    ConfigMissing(PathBuf),

    #[error("Invalid executable path {}: {reason}", path.display())]
    InvalidExecutablePath { path: PathBuf, reason: String },

    #[error("Process error: {0}")]
    Process(#[from] crate::port::ProcessError),

    #[error("Monitoring is already active")]
    MonitoringActive,

    #[error("Another monitor instance is already running")]
    InstanceRunning(Option<i32>),

    #[error("Monitor controller is no longer running")]
    ControllerClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Map a launcher validation failure onto the operator-facing error
    pub fn from_validation(path: impl Into<PathBuf>, err: crate::port::ProcessError) -> Self {
        match err {
            crate::port::ProcessError::InvalidPath(reason) => AppError::InvalidExecutablePath {
                path: path.into(),
                reason,
            },
            other => AppError::Process(other),
        }
    }
}
