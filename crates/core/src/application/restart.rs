// Restart policy - bounded attempts with fixed backoff
use crate::domain::SupervisionState;
use std::time::Duration;
use tracing::{info, warn};

use super::supervisor::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RESTART_DELAY};

/// Restart decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RestartDecision {
    /// Launch again after the delay; `attempt` is the counter just recorded
    Retry { attempt: u32, delay: Duration },
    /// Budget exhausted, supervision fails permanently
    GiveUp { attempts: u32 },
}

/// Restart policy
///
/// Every unexpected exit or spawn failure consumes one attempt. The run
/// that consumes the last attempt is not followed by another launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RESTART_DELAY)
    }
}

impl RestartPolicy {
    /// Create a new restart policy
    ///
    /// # Arguments
    /// * `max_attempts` - Failed runs tolerated per session (default: 5)
    /// * `delay` - Fixed wait before each relaunch (default: 5s)
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Fresh per-session state
    pub fn new_state(&self) -> SupervisionState {
        SupervisionState::new(self.max_attempts)
    }

    /// Record a failed run and decide what comes next
    ///
    /// # Example
    /// ```text
    /// match policy.on_failure(&mut state) {
    ///     RestartDecision::Retry { attempt, delay } => { /* sleep, relaunch */ }
    ///     RestartDecision::GiveUp { attempts } => { /* alert, stop */ }
    /// }
    /// ```
    pub fn on_failure(&self, state: &mut SupervisionState) -> RestartDecision {
        let attempt = match state.record_attempt() {
            Ok(attempt) => attempt,
            Err(e) => {
                warn!(error = %e, "Attempt recorded after budget was exhausted");
                return RestartDecision::GiveUp {
                    attempts: state.attempt(),
                };
            }
        };

        if state.is_exhausted() {
            warn!(
                attempt = attempt,
                max_attempts = self.max_attempts,
                "Max restart attempts reached"
            );
            return RestartDecision::GiveUp { attempts: attempt };
        }

        info!(
            attempt = attempt,
            max_attempts = self.max_attempts,
            delay_ms = self.delay.as_millis() as u64,
            "Scheduling restart"
        );

        RestartDecision::Retry {
            attempt,
            delay: self.delay,
        }
    }
}
