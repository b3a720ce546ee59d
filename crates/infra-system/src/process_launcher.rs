// Process launcher implementation
// reason: tokio::process for async wait, nix for graceful SIGTERM on unix
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{info, warn};

use shardmon_core::application::supervisor::constants::GRACEFUL_SHUTDOWN_TIMEOUT;
use shardmon_core::domain::ExitOutcome;
use shardmon_core::port::{ChildProcess, ProcessError, ProcessLauncher};

/// Spawns the shard executable as a real OS process
///
/// The child shares the monitor's console output. Children are never
/// killed on drop, so releasing a handle leaves the shard running.
pub struct TokioProcessLauncher {
    grace_period: Duration,
    inherit_stdin: bool,
}

impl Default for TokioProcessLauncher {
    fn default() -> Self {
        Self::new(GRACEFUL_SHUTDOWN_TIMEOUT, true)
    }
}

impl TokioProcessLauncher {
    /// Create a new launcher
    ///
    /// # Arguments
    /// * `grace_period` - Time between SIGTERM and SIGKILL on terminate
    /// * `inherit_stdin` - Hand the terminal's stdin to the shard; pass
    ///   `false` when the monitor console reads stdin itself
    ///
    /// # Example
    /// ```ignore
    /// let launcher = TokioProcessLauncher::new(Duration::from_secs(5), false);
    /// let child = launcher.launch(Path::new("/srv/shard/uox3"))?;
    /// ```
    pub fn new(grace_period: Duration, inherit_stdin: bool) -> Self {
        Self {
            grace_period,
            inherit_stdin,
        }
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, ProcessError> {
        path.canonicalize()
            .map_err(|e| ProcessError::InvalidPath(format!("{}: {}", path.display(), e)))
    }
}

impl ProcessLauncher for TokioProcessLauncher {
    fn validate(&self, path: &Path) -> Result<(), ProcessError> {
        if path.as_os_str().is_empty() {
            return Err(ProcessError::InvalidPath("path is empty".to_string()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| {
            ProcessError::InvalidPath(format!("{} is not accessible: {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(ProcessError::InvalidPath(format!(
                "{} is not a file",
                path.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(ProcessError::InvalidPath(format!(
                    "{} is not executable",
                    path.display()
                )));
            }
        }

        Ok(())
    }

    fn launch(&self, path: &Path) -> Result<Box<dyn ChildProcess>, ProcessError> {
        let exe = self.resolve(path)?;
        let working_dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();

        let stdin = if self.inherit_stdin {
            Stdio::inherit()
        } else {
            Stdio::null()
        };

        let child = Command::new(&exe)
            .current_dir(&working_dir)
            .stdin(stdin)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed(format!("{}: {}", exe.display(), e)))?;

        info!(
            exe = %exe.display(),
            working_dir = %working_dir.display(),
            pid = ?child.id(),
            "Spawned shard process"
        );

        Ok(Box::new(TokioChild {
            child,
            grace_period: self.grace_period,
        }))
    }
}

/// Live handle to a spawned shard process
pub struct TokioChild {
    child: Child,
    grace_period: Duration,
}

impl TokioChild {
    /// Ask the process to exit (SIGTERM) without waiting
    #[cfg(unix)]
    fn request_exit(&self) -> Result<bool, ProcessError> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id() else {
            return Ok(false);
        };

        info!(pid = %pid, "Sending SIGTERM for graceful shutdown");
        kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
            .map_err(|e| ProcessError::TerminateFailed(format!("SIGTERM failed: {}", e)))?;
        Ok(true)
    }

    #[cfg(not(unix))]
    fn request_exit(&self) -> Result<bool, ProcessError> {
        // No graceful signal available: go straight to kill
        Ok(false)
    }
}

#[async_trait]
impl ChildProcess for TokioChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn wait(&mut self) -> Result<ExitOutcome, ProcessError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| ProcessError::WaitFailed(e.to_string()))?;

        Ok(ExitOutcome {
            code: status.code(),
            success: status.success(),
        })
    }

    async fn terminate(&mut self) -> Result<(), ProcessError> {
        if !self.is_alive() {
            return Ok(());
        }

        if self.request_exit()? {
            match timeout(self.grace_period, self.child.wait()).await {
                Ok(Ok(_)) => {
                    info!("Process exited gracefully after SIGTERM");
                    return Ok(());
                }
                Ok(Err(e)) => return Err(ProcessError::WaitFailed(e.to_string())),
                Err(_) => {
                    warn!(
                        grace_ms = self.grace_period.as_millis() as u64,
                        "Process did not exit after SIGTERM, killing"
                    );
                }
            }
        }

        self.child
            .kill()
            .await
            .map_err(|e| ProcessError::TerminateFailed(e.to_string()))
    }
}
