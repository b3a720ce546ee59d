// Process Launcher Port
// Abstraction over spawning, waiting on and terminating the shard process

use crate::domain::ExitOutcome;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Invalid executable: {0}")]
    InvalidPath(String),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Wait failed: {0}")]
    WaitFailed(String),

    #[error("Terminate failed: {0}")]
    TerminateFailed(String),
}

/// Handle to a spawned child
///
/// Dropping the handle detaches the child: it keeps running.
#[async_trait]
pub trait ChildProcess: Send {
    /// OS process id, if still known
    fn id(&self) -> Option<u32>;

    /// Non-blocking liveness check
    fn is_alive(&mut self) -> bool;

    /// Wait until the child exits
    ///
    /// Must be cancel-safe: dropping the future leaves the child untouched.
    async fn wait(&mut self) -> Result<ExitOutcome, ProcessError>;

    /// Terminate the child and reap it
    async fn terminate(&mut self) -> Result<(), ProcessError>;
}

/// Process launcher trait
///
/// Implementations:
/// - TokioProcessLauncher: spawns the real executable (infra-system)
/// - MockProcessLauncher: scripted children for tests
pub trait ProcessLauncher: Send + Sync {
    /// Check that `path` names an existing, executable file
    ///
    /// # Errors
    /// - ProcessError::InvalidPath if missing, not a file or not executable
    fn validate(&self, path: &Path) -> Result<(), ProcessError>;

    /// Spawn `path` with no arguments, working directory = its parent
    ///
    /// # Errors
    /// - ProcessError::SpawnFailed if the OS refuses to start it
    fn launch(&self, path: &Path) -> Result<Box<dyn ChildProcess>, ProcessError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Scripted behavior for one launch
    #[derive(Debug, Clone)]
    pub enum MockRun {
        /// Child exits with this code after the delay
        Exit { code: i32, after: Duration },
        /// Child never exits on its own
        Hang,
        /// Child exits with this code once the gate is opened
        ExitWhen { code: i32, gate: Arc<Notify> },
        /// Spawn itself fails
        SpawnFail(String),
    }

    /// Shared view of the most recent mock child
    #[derive(Debug, Default)]
    pub struct MockChildState {
        pub alive: AtomicBool,
        pub terminated: AtomicBool,
    }

    /// Mock launcher replaying a script, repeating the last entry
    pub struct MockProcessLauncher {
        script: Mutex<VecDeque<MockRun>>,
        fallback: MockRun,
        launches: AtomicUsize,
        valid: bool,
        last_child: Mutex<Option<Arc<MockChildState>>>,
    }

    impl MockProcessLauncher {
        pub fn new(script: Vec<MockRun>) -> Self {
            let fallback = script.last().cloned().unwrap_or(MockRun::Hang);
            Self {
                script: Mutex::new(script.into()),
                fallback,
                launches: AtomicUsize::new(0),
                valid: true,
                last_child: Mutex::new(None),
            }
        }

        /// Every child exits immediately with `code`
        pub fn always_exit(code: i32) -> Self {
            Self::new(vec![MockRun::Exit {
                code,
                after: Duration::ZERO,
            }])
        }

        /// Every child runs until terminated
        pub fn hanging() -> Self {
            Self::new(vec![MockRun::Hang])
        }

        /// Launcher that rejects every path on validation
        pub fn invalid() -> Self {
            Self {
                valid: false,
                ..Self::hanging()
            }
        }

        pub fn launch_count(&self) -> usize {
            self.launches.load(Ordering::SeqCst)
        }

        pub fn last_child(&self) -> Option<Arc<MockChildState>> {
            self.last_child.lock().unwrap().clone()
        }
    }

    impl ProcessLauncher for MockProcessLauncher {
        fn validate(&self, path: &Path) -> Result<(), ProcessError> {
            if self.valid {
                Ok(())
            } else {
                Err(ProcessError::InvalidPath(format!(
                    "{} does not exist",
                    path.display()
                )))
            }
        }

        fn launch(&self, _path: &Path) -> Result<Box<dyn ChildProcess>, ProcessError> {
            self.launches.fetch_add(1, Ordering::SeqCst);

            let run = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());

            let exit = match run {
                MockRun::SpawnFail(msg) => return Err(ProcessError::SpawnFailed(msg)),
                MockRun::Exit { code, after } => MockExit::After(code, after),
                MockRun::ExitWhen { code, gate } => MockExit::When(code, gate),
                MockRun::Hang => MockExit::Never,
            };

            let state = Arc::new(MockChildState::default());
            state.alive.store(true, Ordering::SeqCst);
            *self.last_child.lock().unwrap() = Some(Arc::clone(&state));

            Ok(Box::new(MockChild {
                pid: 1000 + self.launch_count() as u32,
                exit,
                state,
            }))
        }
    }

    enum MockExit {
        After(i32, Duration),
        When(i32, Arc<Notify>),
        Never,
    }

    struct MockChild {
        pid: u32,
        exit: MockExit,
        state: Arc<MockChildState>,
    }

    #[async_trait]
    impl ChildProcess for MockChild {
        fn id(&self) -> Option<u32> {
            Some(self.pid)
        }

        fn is_alive(&mut self) -> bool {
            self.state.alive.load(Ordering::SeqCst)
        }

        async fn wait(&mut self) -> Result<ExitOutcome, ProcessError> {
            let code = match &self.exit {
                MockExit::After(code, after) => {
                    tokio::time::sleep(*after).await;
                    *code
                }
                MockExit::When(code, gate) => {
                    gate.notified().await;
                    *code
                }
                MockExit::Never => std::future::pending().await,
            };
            self.state.alive.store(false, Ordering::SeqCst);
            Ok(ExitOutcome {
                code: Some(code),
                success: code == 0,
            })
        }

        async fn terminate(&mut self) -> Result<(), ProcessError> {
            self.state.alive.store(false, Ordering::SeqCst);
            self.state.terminated.store(true, Ordering::SeqCst);
            Ok(())
        }
    }
}
