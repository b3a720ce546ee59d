// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid supervisor phase transition: {from} -> {to}")]
    InvalidPhaseTransition { from: String, to: String },

    #[error("Attempt budget exhausted ({attempts}/{max_attempts})")]
    AttemptsExhausted { attempts: u32, max_attempts: u32 },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
