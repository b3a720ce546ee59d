//! Shared fixtures for the end-to-end tests
//!
//! Builds a real controller (tokio launcher, file adapters) inside a temp
//! directory. Alerts go to the in-memory mock sink so nothing leaves the host.

use shardmon_core::application::{MonitorController, MonitorHandle, MonitorPorts, RestartPolicy};
use shardmon_core::domain::{MonitorConfig, SupervisorPhase};
use shardmon_core::port::alert_sink::mocks::MockAlertSink;
use shardmon_infra_file::{FileConfigStore, FileEventLog, FileStatusSource, IniShardNameSource};
use shardmon_infra_system::TokioProcessLauncher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const SHARD_NAME: &str = "Britannia";
pub const WEBHOOK: &str = "https://hooks.test/e2e";

pub struct Harness {
    pub dir: TempDir,
    pub handle: MonitorHandle,
    pub sink: MockAlertSink,
    pub event_log: Arc<FileEventLog>,
}

impl Harness {
    /// Controller for `script_body`, written as an executable shell script
    pub fn new(script_body: &str, restart_delay: Duration, html_enabled: bool) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let exe = write_script(dir.path(), "shard.sh", script_body);

        let ini = dir.path().join("uox3.ini");
        std::fs::write(&ini, format!("[system]\n{{\nSERVERNAME={}\n}}\n", SHARD_NAME))
            .expect("write ini");

        let config = MonitorConfig {
            exe_path: exe,
            ini_path: ini,
            use_discord: true,
            discord_webhook: WEBHOOK.to_string(),
            status_html_path: dir.path().join("serverstatus.html"),
            html_status_enabled: html_enabled,
            html_status_interval_secs: 10,
        };

        let sink = MockAlertSink::new();
        let event_log = Arc::new(FileEventLog::new(dir.path().join("restart.log")));
        let ports = MonitorPorts {
            launcher: Arc::new(TokioProcessLauncher::new(Duration::from_secs(2), false)),
            event_log: event_log.clone(),
            alert_sink: Arc::new(sink.clone()),
            status_source: Arc::new(FileStatusSource),
            config_store: Arc::new(FileConfigStore::new(dir.path().join("config.txt"))),
            shard_source: Arc::new(IniShardNameSource),
        };

        let controller =
            MonitorController::new(config, ports, RestartPolicy::new(5, restart_delay));

        Self {
            dir,
            handle: controller.spawn(),
            sink,
            event_log,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Event log contents, one entry per line
    pub async fn log_lines(&self) -> Vec<String> {
        self.event_log.tail(usize::MAX).await.expect("read event log")
    }

    /// Wait (bounded) for a phase matching `pred`
    pub async fn wait_phase(
        &self,
        pred: impl FnMut(&SupervisorPhase) -> bool,
    ) -> SupervisorPhase {
        let mut phase = self.handle.phase();
        let current = tokio::time::timeout(Duration::from_secs(10), phase.wait_for(pred))
            .await
            .expect("phase not reached in time")
            .expect("controller closed");
        current.clone()
    }
}

/// Write an executable `#!/bin/sh` script
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
    }

    path
}

/// Poll `check` until it holds or the timeout elapses
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
