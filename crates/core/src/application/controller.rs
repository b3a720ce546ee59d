// Monitor Controller - command loop owning the supervision session
// Console/CLI layers talk to it over a channel; it is the only mutator of
// session state.

use crate::application::notifier::{AlertSettings, Notifier};
use crate::application::restart::RestartPolicy;
use crate::application::status_poller::{PollSettings, StatusPoller};
use crate::application::supervisor::{shutdown_channel, ShutdownSender, StopMode, Supervisor};
use crate::domain::{
    MonitorConfig, PathSetting, SupervisionOutcome, SupervisorPhase, DEFAULT_SHARD_NAME,
};
use crate::error::{AppError, Result};
use crate::port::{
    AlertSink, ConfigStore, EventLog, ProcessLauncher, ShardNameSource, StatusSource,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const COMMAND_BUFFER: usize = 16;

/// Adapters the controller wires into each session
#[derive(Clone)]
pub struct MonitorPorts {
    pub launcher: Arc<dyn ProcessLauncher>,
    pub event_log: Arc<dyn EventLog>,
    pub alert_sink: Arc<dyn AlertSink>,
    pub status_source: Arc<dyn StatusSource>,
    pub config_store: Arc<dyn ConfigStore>,
    pub shard_source: Arc<dyn ShardNameSource>,
}

/// Snapshot answered to `Status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorStatus {
    pub phase: SupervisorPhase,
    pub active: bool,
    pub shard_name: String,
    pub exe_path: PathBuf,
    pub allow_kill_on_stop: bool,
    pub status_polling: bool,
}

/// Commands accepted by the controller
pub enum MonitorCommand {
    Start {
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<Option<SupervisionOutcome>>,
    },
    ToggleKillOnStop {
        reply: oneshot::Sender<bool>,
    },
    Status {
        reply: oneshot::Sender<MonitorStatus>,
    },
    SetPath {
        setting: PathSetting,
        path: PathBuf,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Stop the session (current kill policy) and end the command loop
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// One Start..Stop span: supervisor + poller behind a single join handle
struct Session {
    shutdown: ShutdownSender,
    handle: JoinHandle<SupervisionOutcome>,
}

impl Session {
    fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

pub struct MonitorController {
    config: MonitorConfig,
    shard_name: String,
    allow_kill_on_stop: bool,
    ports: MonitorPorts,
    policy: RestartPolicy,
    phase: Arc<watch::Sender<SupervisorPhase>>,
    session: Option<Session>,
}

impl MonitorController {
    /// Create a controller; the shard name is looked up right away
    pub fn new(config: MonitorConfig, ports: MonitorPorts, policy: RestartPolicy) -> Self {
        let shard_name = lookup_shard_name(&ports, &config);
        let (phase, _) = watch::channel(SupervisorPhase::Idle);

        Self {
            config,
            shard_name,
            allow_kill_on_stop: true,
            ports,
            policy,
            phase: Arc::new(phase),
            session: None,
        }
    }

    pub fn shard_name(&self) -> &str {
        &self.shard_name
    }

    /// Spawn the command loop (background task)
    pub fn spawn(self) -> MonitorHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let phase = self.phase.subscribe();
        tokio::spawn(self.run(rx));
        MonitorHandle { tx, phase }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<MonitorCommand>) {
        info!(shard = %self.shard_name, "Monitor controller started");

        while let Some(command) = rx.recv().await {
            match command {
                MonitorCommand::Start { reply } => {
                    let _ = reply.send(self.start().await);
                }
                MonitorCommand::Stop { reply } => {
                    let _ = reply.send(self.stop().await);
                }
                MonitorCommand::ToggleKillOnStop { reply } => {
                    let _ = reply.send(self.toggle_kill_on_stop().await);
                }
                MonitorCommand::Status { reply } => {
                    let _ = reply.send(self.status());
                }
                MonitorCommand::SetPath {
                    setting,
                    path,
                    reply,
                } => {
                    let _ = reply.send(self.set_path(setting, path).await);
                }
                MonitorCommand::Shutdown { reply } => {
                    self.stop().await;
                    self.notifier().log("Exited monitor.").await;
                    let _ = reply.send(());
                    info!("Monitor controller stopped");
                    return;
                }
            }
        }

        // Every handle dropped: clean up like an explicit shutdown
        self.stop().await;
        info!("Monitor controller stopped (all handles dropped)");
    }

    /// Begin a new supervision session
    async fn start(&mut self) -> Result<()> {
        // A session that already gave up may still be winding down its poller
        let winding_down = self.phase.borrow().is_terminal();
        if self.session.as_ref().is_some_and(Session::is_active) && !winding_down {
            return Err(AppError::MonitoringActive);
        }
        // Reap a session that ended on its own (budget exhausted)
        if let Some(finished) = self.session.take() {
            let _ = finished.handle.await;
        }

        let exe_path = self.config.exe_path.clone();
        self.ports
            .launcher
            .validate(&exe_path)
            .map_err(|e| AppError::from_validation(&exe_path, e))?;

        let notifier = self.notifier();
        let supervisor = Supervisor::new(
            exe_path.clone(),
            self.shard_name.clone(),
            Arc::clone(&self.ports.launcher),
            Arc::clone(&notifier),
            self.policy.clone(),
            Arc::clone(&self.phase),
        );
        let poller = StatusPoller::new(
            PollSettings::new(
                self.config.status_html_path.clone(),
                self.config.html_status_enabled,
                self.config.html_status_interval_secs,
            ),
            self.shard_name.clone(),
            Arc::clone(&self.ports.status_source),
            Arc::clone(&notifier),
        );

        notifier
            .log(&format!("Starting shard monitor {}", crate::VERSION))
            .await;

        let (shutdown, token) = shutdown_channel();
        let handle = tokio::spawn(async move {
            let (poll_stop, poll_token) = shutdown_channel();
            let poller = tokio::spawn(poller.run(poll_token));

            let outcome = supervisor.run(token).await;

            poll_stop.shutdown(StopMode::DetachChild);
            if let Err(e) = poller.await {
                error!(error = ?e, "Status poller task failed");
            }
            outcome
        });

        self.session = Some(Session { shutdown, handle });
        info!(exe = %exe_path.display(), "Monitoring started");
        Ok(())
    }

    /// Stop the session and wait until its tasks are gone
    async fn stop(&mut self) -> Option<SupervisionOutcome> {
        let Some(session) = self.session.take() else {
            info!("Stop requested but monitoring is not active");
            return None;
        };

        session
            .shutdown
            .shutdown(StopMode::from_allow_kill(self.allow_kill_on_stop));

        let outcome = match session.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = ?e, "Supervision task failed");
                None
            }
        };

        info!(outcome = ?outcome, "Monitoring stopped");
        self.notifier().log("Monitoring stopped.").await;
        outcome
    }

    async fn toggle_kill_on_stop(&mut self) -> bool {
        self.allow_kill_on_stop = !self.allow_kill_on_stop;

        let behavior = if self.allow_kill_on_stop {
            "Will kill shard on Stop"
        } else {
            "Will NOT kill shard on Stop"
        };
        info!(allow_kill_on_stop = self.allow_kill_on_stop, "Kill behavior updated");
        self.notifier()
            .log(&format!("Updated kill behavior: {}", behavior))
            .await;

        self.allow_kill_on_stop
    }

    fn status(&self) -> MonitorStatus {
        MonitorStatus {
            phase: self.phase.borrow().clone(),
            active: self.session.as_ref().is_some_and(Session::is_active),
            shard_name: self.shard_name.clone(),
            exe_path: self.config.exe_path.clone(),
            allow_kill_on_stop: self.allow_kill_on_stop,
            status_polling: self.config.html_status_enabled,
        }
    }

    /// Change a path setting and persist it; applies to the next session
    async fn set_path(&mut self, setting: PathSetting, path: PathBuf) -> Result<()> {
        if setting == PathSetting::Executable {
            self.ports
                .launcher
                .validate(&path)
                .map_err(|e| AppError::from_validation(&path, e))?;
        }

        let mut updated = self.config.clone();
        updated.set_path(setting, path.clone())?;
        self.ports.config_store.save(&updated)?;
        self.config = updated;

        info!(setting = %setting, path = %path.display(), "Path updated");
        self.notifier()
            .log(&format!("{} path set to: {}", setting, path.display()))
            .await;

        if setting == PathSetting::Ini {
            self.shard_name = lookup_shard_name(&self.ports, &self.config);
            self.notifier()
                .log(&format!("Shard name: {}", self.shard_name))
                .await;
        }

        Ok(())
    }

    fn notifier(&self) -> Arc<Notifier> {
        let settings = match self.config.alert_endpoint() {
            Some(endpoint) => AlertSettings::new(true, endpoint),
            None => AlertSettings::disabled(),
        };
        Arc::new(Notifier::new(
            Arc::clone(&self.ports.event_log),
            Arc::clone(&self.ports.alert_sink),
            settings,
        ))
    }
}

fn lookup_shard_name(ports: &MonitorPorts, config: &MonitorConfig) -> String {
    match ports.shard_source.shard_name(&config.ini_path) {
        Some(name) => {
            info!(shard = %name, "Shard name loaded");
            name
        }
        None => {
            warn!(ini = %config.ini_path.display(), "Shard name not found, using default");
            DEFAULT_SHARD_NAME.to_string()
        }
    }
}

/// Cloneable client side of the controller
#[derive(Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<MonitorCommand>,
    phase: watch::Receiver<SupervisorPhase>,
}

impl MonitorHandle {
    /// Start monitoring
    ///
    /// # Errors
    /// - AppError::MonitoringActive if a session is already running
    /// - AppError::InvalidExecutablePath if the configured executable is unusable
    pub async fn start(&self) -> Result<()> {
        self.request(|reply| MonitorCommand::Start { reply }).await?
    }

    /// Stop monitoring; returns once the supervisor and poller have exited
    ///
    /// `None` when nothing was running.
    pub async fn stop(&self) -> Result<Option<SupervisionOutcome>> {
        self.request(|reply| MonitorCommand::Stop { reply }).await
    }

    /// Flip whether Stop terminates the shard; returns the new setting
    pub async fn toggle_kill_on_stop(&self) -> Result<bool> {
        self.request(|reply| MonitorCommand::ToggleKillOnStop { reply })
            .await
    }

    pub async fn status(&self) -> Result<MonitorStatus> {
        self.request(|reply| MonitorCommand::Status { reply }).await
    }

    /// Update and persist a path setting
    pub async fn set_path(&self, setting: PathSetting, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        self.request(|reply| MonitorCommand::SetPath {
            setting,
            path,
            reply,
        })
        .await?
    }

    /// Stop monitoring and end the controller
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| MonitorCommand::Shutdown { reply })
            .await
    }

    /// Watch supervisor phase changes
    pub fn phase(&self) -> watch::Receiver<SupervisorPhase> {
        self.phase.clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> MonitorCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| AppError::ControllerClosed)?;
        response.await.map_err(|_| AppError::ControllerClosed)
    }
}
