// Status Poller - periodic diff-and-notify over the status artifact

use crate::application::notifier::Notifier;
use crate::application::supervisor::ShutdownToken;
use crate::domain::{StatusLabels, StatusSnapshot, MIN_STATUS_INTERVAL_SECS};
use crate::port::StatusSource;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Poller settings taken from the operator config
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub path: PathBuf,
    pub enabled: bool,
    pub interval: Duration,
    pub labels: StatusLabels,
}

impl PollSettings {
    /// Settings with the interval clamped to the 10s floor
    pub fn new(path: impl Into<PathBuf>, enabled: bool, interval_secs: u64) -> Self {
        Self {
            path: path.into(),
            enabled,
            interval: Duration::from_secs(interval_secs.max(MIN_STATUS_INTERVAL_SECS)),
            labels: StatusLabels::default(),
        }
    }
}

/// Result of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Disabled,
    ArtifactMissing,
    ReadFailed,
    ParseFailed,
    Unchanged(StatusSnapshot),
    Changed(StatusSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Missing,
    ReadError,
    Unparsable,
}

/// Polls the status artifact and notifies when the counters change
///
/// Owns the last snapshot exclusively. Ticks run one after another inside
/// a single task, so a poll never overlaps the previous one.
pub struct StatusPoller {
    settings: PollSettings,
    shard_name: String,
    source: Arc<dyn StatusSource>,
    notifier: Arc<Notifier>,
    last: StatusSnapshot,
    last_skip: Option<SkipReason>,
}

impl StatusPoller {
    pub fn new(
        settings: PollSettings,
        shard_name: impl Into<String>,
        source: Arc<dyn StatusSource>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            settings,
            shard_name: shard_name.into(),
            source,
            notifier,
            last: StatusSnapshot::UNKNOWN,
            last_skip: None,
        }
    }

    /// Last snapshot seen (UNKNOWN before the first successful read)
    pub fn last_snapshot(&self) -> StatusSnapshot {
        self.last
    }

    /// Run one poll-parse-diff-notify cycle
    pub async fn poll_once(&mut self) -> PollOutcome {
        if !self.settings.enabled {
            return PollOutcome::Disabled;
        }

        let text = match self.source.read_status(&self.settings.path).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                self.skip(SkipReason::Missing).await;
                return PollOutcome::ArtifactMissing;
            }
            Err(e) => {
                warn!(path = %self.settings.path.display(), error = %e, "Failed to read status artifact");
                self.notifier
                    .log(&format!("[HTML Parser] Error: {}", e))
                    .await;
                self.last_skip = Some(SkipReason::ReadError);
                return PollOutcome::ReadFailed;
            }
        };

        let snapshot = StatusSnapshot::parse(&text, &self.settings.labels);
        if snapshot == StatusSnapshot::UNKNOWN {
            // Empty or half-written page: keep the last good counters
            self.skip(SkipReason::Unparsable).await;
            return PollOutcome::ParseFailed;
        }
        self.last_skip = None;

        if snapshot == self.last {
            debug!(?snapshot, "Status unchanged");
            return PollOutcome::Unchanged(snapshot);
        }

        info!(
            players = snapshot.players,
            gms = snapshot.gms,
            counselors = snapshot.counselors,
            "Status changed"
        );
        self.last = snapshot;
        self.notifier
            .notify(&snapshot.to_message(&self.shard_name))
            .await;

        PollOutcome::Changed(snapshot)
    }

    /// Run the poll loop until the session stops (background task)
    ///
    /// The first tick fires immediately; missed ticks are skipped.
    pub async fn run(mut self, mut shutdown: ShutdownToken) {
        if !self.settings.enabled {
            info!("Status polling disabled by config");
            self.notifier.log("[HTML Timer] Disabled by config.").await;
            return;
        }

        info!(
            path = %self.settings.path.display(),
            interval_secs = self.settings.interval.as_secs(),
            "Status poller started"
        );
        self.notifier
            .log(&format!(
                "[HTML Timer] Monitoring every {}s: {}",
                self.settings.interval.as_secs(),
                self.settings.path.display()
            ))
            .await;

        let mut tick = interval(self.settings.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.poll_once().await;
                }
                _ = shutdown.wait() => {
                    break;
                }
            }
        }

        info!("Status poller stopped");
        self.notifier.log("Stopped HTML status timer.").await;
    }

    /// Log a skipped tick once per condition, not every tick
    async fn skip(&mut self, reason: SkipReason) {
        if self.last_skip == Some(reason) {
            return;
        }
        self.last_skip = Some(reason);

        let path = self.settings.path.display();
        let line = match reason {
            SkipReason::Missing => {
                warn!(path = %path, "Status artifact not found, skipping");
                format!("[HTML Timer] File not found: {}", path)
            }
            SkipReason::Unparsable => {
                warn!(path = %path, "No status counters found, skipping");
                format!("[HTML Parser] No status counters found in {}", path)
            }
            SkipReason::ReadError => return,
        };
        self.notifier.log(&line).await;
    }
}
