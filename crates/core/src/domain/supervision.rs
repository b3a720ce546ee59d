// Supervision Domain Model
// Phases of one supervised child and the per-session attempt counter

use super::error::{DomainError, Result};

/// Supervisor lifecycle phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorPhase {
    /// No session active
    Idle,
    /// About to spawn the child
    Starting { attempt: u32 },
    /// Child alive
    Running { pid: Option<u32> },
    /// Child gone, decision pending
    Exited { code: Option<i32> },
    /// Waiting out the restart delay
    Restarting { attempt: u32 },
    /// Stopped by the operator (terminal, non-error)
    Stopped,
    /// Attempt budget exhausted (terminal, error)
    Failed { attempts: u32 },
}

impl SupervisorPhase {
    /// Terminal phases end the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorPhase::Stopped | SupervisorPhase::Failed { .. })
    }

    /// Validate a phase change
    pub fn can_transition_to(&self, next: &SupervisorPhase) -> bool {
        use SupervisorPhase::*;
        matches!(
            (self, next),
            (Idle | Stopped | Failed { .. }, Starting { .. })
                | (Starting { .. }, Running { .. })
                | (Starting { .. }, Restarting { .. })
                | (Starting { .. }, Failed { .. })
                | (Running { .. }, Exited { .. })
                | (Exited { .. }, Restarting { .. })
                | (Exited { .. }, Failed { .. })
                | (Restarting { .. }, Starting { .. })
                | (
                    Idle | Starting { .. } | Running { .. } | Exited { .. } | Restarting { .. },
                    Stopped
                )
        )
    }

    /// Check a phase change, describing it on failure
    pub fn transition_to(&self, next: &SupervisorPhase) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidPhaseTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for SupervisorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorPhase::Idle => write!(f, "IDLE"),
            SupervisorPhase::Starting { attempt } => write!(f, "STARTING (attempt {})", attempt),
            SupervisorPhase::Running { pid: Some(pid) } => write!(f, "RUNNING (pid {})", pid),
            SupervisorPhase::Running { pid: None } => write!(f, "RUNNING"),
            SupervisorPhase::Exited { code: Some(code) } => write!(f, "EXITED (code {})", code),
            SupervisorPhase::Exited { code: None } => write!(f, "EXITED (signal)"),
            SupervisorPhase::Restarting { attempt } => {
                write!(f, "RESTARTING (attempt {})", attempt)
            }
            SupervisorPhase::Stopped => write!(f, "STOPPED"),
            SupervisorPhase::Failed { attempts } => write!(f, "FAILED after {} attempts", attempts),
        }
    }
}

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub success: bool,
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Final result of a supervision session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionOutcome {
    /// Operator stop; `attempts` counted before the stop
    Stopped { attempts: u32 },
    /// Budget exhausted
    Failed { attempts: u32 },
}

/// Per-session restart bookkeeping
///
/// `attempt` only grows; a new session means a new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisionState {
    attempt: u32,
    max_attempts: u32,
}

impl SupervisionState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Count one failed run (unexpected exit or spawn failure)
    pub fn record_attempt(&mut self) -> Result<u32> {
        if self.is_exhausted() {
            return Err(DomainError::AttemptsExhausted {
                attempts: self.attempt,
                max_attempts: self.max_attempts,
            });
        }
        self.attempt += 1;
        Ok(self.attempt)
    }
}
