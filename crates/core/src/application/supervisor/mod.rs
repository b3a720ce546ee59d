// Supervisor - shard process lifecycle loop

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken, StopMode};

use crate::application::notifier::Notifier;
use crate::application::restart::{RestartDecision, RestartPolicy};
use crate::domain::{ExitOutcome, SupervisionOutcome, SupervisionState, SupervisorPhase};
use crate::port::{ChildProcess, ProcessError, ProcessLauncher};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// How one launch ended
enum RunResult {
    /// Child exited on its own (or spawn failed)
    Failed(String),
    /// Stop requested while the child was alive; child already released
    Stopped,
}

/// Supervises one shard executable for one session
///
/// Sole owner of the child handle and the attempt counter. The only
/// cancellation points are the child's exit, the restart decision and the
/// restart delay.
pub struct Supervisor {
    exe_path: PathBuf,
    shard_name: String,
    launcher: Arc<dyn ProcessLauncher>,
    notifier: Arc<Notifier>,
    policy: RestartPolicy,
    phase: Arc<watch::Sender<SupervisorPhase>>,
}

impl Supervisor {
    pub fn new(
        exe_path: impl Into<PathBuf>,
        shard_name: impl Into<String>,
        launcher: Arc<dyn ProcessLauncher>,
        notifier: Arc<Notifier>,
        policy: RestartPolicy,
        phase: Arc<watch::Sender<SupervisorPhase>>,
    ) -> Self {
        Self {
            exe_path: exe_path.into(),
            shard_name: shard_name.into(),
            launcher,
            notifier,
            policy,
            phase,
        }
    }

    /// Run the launch-wait-restart loop until stopped or out of attempts
    pub async fn run(self, mut shutdown: ShutdownToken) -> SupervisionOutcome {
        let mut state = self.policy.new_state();
        info!(
            exe = %self.exe_path.display(),
            shard = %self.shard_name,
            max_attempts = state.max_attempts(),
            "Supervisor started"
        );

        loop {
            if shutdown.is_shutdown() {
                return self.finish_stopped(&state).await;
            }

            self.publish(SupervisorPhase::Starting {
                attempt: state.attempt(),
            });

            let reason = match self.launch_and_wait(&mut shutdown).await {
                RunResult::Stopped => return self.finish_stopped(&state).await,
                RunResult::Failed(reason) => reason,
            };

            // Stop wins over any remaining budget
            if shutdown.is_shutdown() {
                self.notifier
                    .log("Monitoring stopped manually. No restart.")
                    .await;
                return self.finish_stopped(&state).await;
            }

            match self.policy.on_failure(&mut state) {
                RestartDecision::Retry { attempt, delay } => {
                    self.notifier
                        .notify(&format!(
                            "{} {} (attempt #{}/{}). Restarting in {}s...",
                            self.shard_name,
                            reason,
                            attempt,
                            state.max_attempts(),
                            delay.as_secs()
                        ))
                        .await;
                    self.publish(SupervisorPhase::Restarting { attempt });

                    tokio::select! {
                        _ = sleep(delay) => {},
                        _ = shutdown.wait() => {
                            info!("Stop requested during restart delay");
                            return self.finish_stopped(&state).await;
                        }
                    }
                }
                RestartDecision::GiveUp { attempts } => {
                    self.notifier
                        .notify(&format!(
                            "{} {} (attempt #{}/{}).",
                            self.shard_name,
                            reason,
                            attempts,
                            state.max_attempts()
                        ))
                        .await;
                    return self.finish_failed(attempts).await;
                }
            }
        }
    }

    /// Spawn the child and wait for it to exit or for a stop request
    async fn launch_and_wait(&self, shutdown: &mut ShutdownToken) -> RunResult {
        let mut child = match self.launcher.launch(&self.exe_path) {
            Ok(child) => child,
            Err(e) => {
                error!(exe = %self.exe_path.display(), error = %e, "Failed to start shard");
                return RunResult::Failed(format!("failed to start ({})", e));
            }
        };

        let pid = child.id();
        self.publish(SupervisorPhase::Running { pid });
        info!(pid = ?pid, exe = %self.exe_path.display(), "Shard process started");
        self.notifier
            .notify(&format!("Shard monitor: {} started.", self.shard_name))
            .await;

        // An exit that lands together with a stop is still an exit
        let waited = tokio::select! {
            biased;
            result = child.wait() => Ok(result),
            mode = shutdown.wait() => Err(mode),
        };

        match waited {
            Ok(result) => {
                let reason = describe_exit(&result);
                let code = result.as_ref().ok().and_then(|outcome| outcome.code);
                self.publish(SupervisorPhase::Exited { code });
                warn!(pid = ?pid, reason = %reason, "Shard process exited");
                RunResult::Failed(reason)
            }
            Err(mode) => {
                self.release_child(child, mode).await;
                RunResult::Stopped
            }
        }
    }

    /// Dispose of a live child according to the stop mode
    async fn release_child(&self, mut child: Box<dyn ChildProcess>, mode: StopMode) {
        match mode {
            StopMode::KillChild => {
                if !child.is_alive() {
                    return;
                }
                match child.terminate().await {
                    Ok(()) => {
                        info!(pid = ?child.id(), "Shard process terminated on stop");
                        self.notifier
                            .log(&format!("Killed {} on stop.", self.shard_name))
                            .await;
                    }
                    Err(e) => {
                        error!(pid = ?child.id(), error = %e, "Failed to terminate shard");
                        self.notifier
                            .log(&format!("Failed to kill {}: {}", self.shard_name, e))
                            .await;
                    }
                }
            }
            StopMode::DetachChild => {
                info!(pid = ?child.id(), "Leaving shard process running");
                self.notifier
                    .log(&format!("Left {} running on stop.", self.shard_name))
                    .await;
                drop(child);
            }
        }
    }

    async fn finish_stopped(&self, state: &SupervisionState) -> SupervisionOutcome {
        info!(attempts = state.attempt(), "Supervisor stopped");
        self.notifier
            .notify(&format!("Shard monitor: {} monitoring stopped.", self.shard_name))
            .await;
        self.publish(SupervisorPhase::Stopped);
        SupervisionOutcome::Stopped {
            attempts: state.attempt(),
        }
    }

    async fn finish_failed(&self, attempts: u32) -> SupervisionOutcome {
        error!(attempts = attempts, "Max restart attempts reached. Monitoring stopped.");
        self.notifier
            .notify(&format!(
                "{} failed {} times. Monitoring stopped.",
                self.shard_name, attempts
            ))
            .await;
        self.publish(SupervisorPhase::Failed { attempts });
        SupervisionOutcome::Failed { attempts }
    }

    fn publish(&self, next: SupervisorPhase) {
        self.phase.send_modify(|current| {
            if let Err(e) = current.transition_to(&next) {
                warn!(error = %e, "Unexpected supervisor phase change");
            }
            *current = next;
        });
    }
}

fn describe_exit(result: &Result<ExitOutcome, ProcessError>) -> String {
    match result {
        Ok(outcome) => format!("exited ({})", outcome),
        Err(e) => format!("was lost ({})", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::notifier::AlertSettings;
    use crate::port::alert_sink::mocks::MockAlertSink;
    use crate::port::event_log::mocks::MockEventLog;
    use crate::port::process::mocks::{MockProcessLauncher, MockRun};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct Fixture {
        launcher: Arc<MockProcessLauncher>,
        sink: MockAlertSink,
        log: MockEventLog,
        phase_rx: watch::Receiver<SupervisorPhase>,
        supervisor: Supervisor,
    }

    fn fixture(launcher: MockProcessLauncher, delay: Duration) -> Fixture {
        let launcher = Arc::new(launcher);
        let sink = MockAlertSink::new();
        let log = MockEventLog::new();
        let notifier = Arc::new(Notifier::new(
            Arc::new(log.clone()),
            Arc::new(sink.clone()),
            AlertSettings::new(true, "https://hooks.test/shard"),
        ));
        let (phase_tx, phase_rx) = watch::channel(SupervisorPhase::Idle);
        let supervisor = Supervisor::new(
            "/srv/shard/uox3",
            "Britannia",
            launcher.clone(),
            notifier,
            RestartPolicy::new(5, delay),
            Arc::new(phase_tx),
        );
        Fixture {
            launcher,
            sink,
            log,
            phase_rx,
            supervisor,
        }
    }

    async fn wait_for_phase(
        rx: &mut watch::Receiver<SupervisorPhase>,
        pred: impl FnMut(&SupervisorPhase) -> bool,
    ) {
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("phase not reached in time")
            .unwrap();
    }

    #[tokio::test]
    async fn test_five_exits_then_failure() {
        let f = fixture(MockProcessLauncher::always_exit(1), Duration::from_millis(1));
        let (_tx, token) = shutdown_channel();

        let outcome = f.supervisor.run(token).await;

        assert_eq!(outcome, SupervisionOutcome::Failed { attempts: 5 });
        assert_eq!(f.launcher.launch_count(), 5);
        assert_eq!(f.sink.count_containing("started."), 5);
        assert_eq!(f.sink.count_containing("(attempt #"), 5);
        assert_eq!(f.sink.count_containing("failed 5 times"), 1);
        assert_eq!(*f.phase_rx.borrow(), SupervisorPhase::Failed { attempts: 5 });
    }

    #[tokio::test]
    async fn test_restart_messages_carry_counter() {
        let f = fixture(MockProcessLauncher::always_exit(3), Duration::from_millis(1));
        let (_tx, token) = shutdown_channel();

        f.supervisor.run(token).await;

        let messages = f.sink.messages();
        assert!(messages.iter().any(|m| m.contains("(attempt #1/5). Restarting")));
        assert!(messages.iter().any(|m| m.contains("(attempt #4/5). Restarting")));
        assert!(messages
            .iter()
            .any(|m| m.ends_with("(attempt #5/5).") && !m.contains("Restarting")));
        assert!(messages.iter().any(|m| m.contains("exit code 3")));
        assert!(!messages.iter().any(|m| m.contains("#6/5")));
    }

    #[tokio::test]
    async fn test_spawn_failure_counts_as_attempt() {
        let launcher = MockProcessLauncher::new(vec![
            MockRun::SpawnFail("permission denied".to_string()),
            MockRun::Hang,
        ]);
        let mut f = fixture(launcher, Duration::from_millis(1));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(f.supervisor.run(token));
        wait_for_phase(&mut f.phase_rx, |p| matches!(p, SupervisorPhase::Running { .. })).await;

        assert_eq!(f.launcher.launch_count(), 2);
        assert!(f.sink.messages().iter().any(|m| m.contains("permission denied")
            && m.contains("(attempt #1/5)")));

        tx.shutdown(StopMode::KillChild);
        let outcome = handle.await.unwrap();
        assert_eq!(outcome, SupervisionOutcome::Stopped { attempts: 1 });
    }

    #[tokio::test]
    async fn test_stop_with_kill_terminates_child() {
        let mut f = fixture(MockProcessLauncher::hanging(), Duration::from_millis(1));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(f.supervisor.run(token));
        wait_for_phase(&mut f.phase_rx, |p| matches!(p, SupervisorPhase::Running { .. })).await;

        tx.shutdown(StopMode::KillChild);
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome, SupervisionOutcome::Stopped { attempts: 0 });
        let child = f.launcher.last_child().unwrap();
        assert!(child.terminated.load(Ordering::SeqCst));
        assert!(!child.alive.load(Ordering::SeqCst));
        assert_eq!(f.launcher.launch_count(), 1);
        assert_eq!(f.sink.count_containing("monitoring stopped"), 1);
        assert!(f.log.contains("Killed Britannia on stop."));
    }

    #[tokio::test]
    async fn test_stop_without_kill_leaves_child_alive() {
        let mut f = fixture(MockProcessLauncher::hanging(), Duration::from_millis(1));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(f.supervisor.run(token));
        wait_for_phase(&mut f.phase_rx, |p| matches!(p, SupervisorPhase::Running { .. })).await;

        tx.shutdown(StopMode::DetachChild);
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("supervisor must join in bounded time")
            .unwrap();

        assert_eq!(outcome, SupervisionOutcome::Stopped { attempts: 0 });
        let child = f.launcher.last_child().unwrap();
        assert!(child.alive.load(Ordering::SeqCst));
        assert!(!child.terminated.load(Ordering::SeqCst));
        assert_eq!(*f.phase_rx.borrow(), SupervisorPhase::Stopped);
    }

    #[tokio::test]
    async fn test_stop_during_restart_delay_prevents_relaunch() {
        let mut f = fixture(MockProcessLauncher::always_exit(1), Duration::from_secs(30));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(f.supervisor.run(token));
        wait_for_phase(&mut f.phase_rx, |p| matches!(p, SupervisorPhase::Restarting { .. })).await;

        tx.shutdown(StopMode::KillChild);
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("restart delay should be interruptible")
            .unwrap();

        assert_eq!(outcome, SupervisionOutcome::Stopped { attempts: 1 });
        assert_eq!(f.launcher.launch_count(), 1);
        assert_eq!(f.sink.count_containing("failed"), 0);
    }

    #[tokio::test]
    async fn test_stop_after_exit_does_not_restart() {
        let gate = Arc::new(Notify::new());
        let launcher = MockProcessLauncher::new(vec![MockRun::ExitWhen {
            code: 1,
            gate: Arc::clone(&gate),
        }]);
        let mut f = fixture(launcher, Duration::from_millis(1));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(f.supervisor.run(token));
        wait_for_phase(&mut f.phase_rx, |p| matches!(p, SupervisorPhase::Running { .. })).await;

        // Stop lands first, then the child exits before the supervisor wakes
        tx.shutdown(StopMode::KillChild);
        gate.notify_one();

        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("supervisor must join in bounded time")
            .unwrap();

        assert_eq!(outcome, SupervisionOutcome::Stopped { attempts: 0 });
        assert_eq!(f.launcher.launch_count(), 1);
        assert!(f.log.contains("Monitoring stopped manually. No restart."));
        assert_eq!(f.sink.count_containing("(attempt #"), 0);
        assert!(!f.log.contains("Killed Britannia on stop."));
    }

    #[tokio::test]
    async fn test_stop_before_start_never_launches() {
        let f = fixture(MockProcessLauncher::hanging(), Duration::from_millis(1));
        let (tx, token) = shutdown_channel();
        tx.shutdown(StopMode::KillChild);

        let outcome = f.supervisor.run(token).await;

        assert_eq!(outcome, SupervisionOutcome::Stopped { attempts: 0 });
        assert_eq!(f.launcher.launch_count(), 0);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_exits() {
        let launcher = MockProcessLauncher::new(vec![
            MockRun::Exit {
                code: 1,
                after: Duration::ZERO,
            },
            MockRun::Exit {
                code: 1,
                after: Duration::ZERO,
            },
            MockRun::Hang,
        ]);
        let mut f = fixture(launcher, Duration::from_millis(1));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(f.supervisor.run(token));
        wait_for_phase(&mut f.phase_rx, |p| {
            matches!(p, SupervisorPhase::Running { pid: Some(1003) })
        })
        .await;

        assert_eq!(f.launcher.launch_count(), 3);
        tx.shutdown(StopMode::DetachChild);
        assert_eq!(
            handle.await.unwrap(),
            SupervisionOutcome::Stopped { attempts: 2 }
        );
    }
}
