// Supervision Stop Signal

use tokio::sync::watch;

/// What happens to a live child when monitoring stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Terminate the child, then reap it
    KillChild,
    /// Leave the child running untouched
    DetachChild,
}

impl StopMode {
    pub fn from_allow_kill(allow_kill_on_stop: bool) -> Self {
        if allow_kill_on_stop {
            StopMode::KillChild
        } else {
            StopMode::DetachChild
        }
    }
}

/// Stop signal observed by the supervisor and poller tasks of one session
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<Option<StopMode>>,
}

impl ShutdownToken {
    /// Check if a stop was requested
    pub fn is_shutdown(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the stop signal
    ///
    /// A dropped sender counts as a stop (with the child detached).
    pub async fn wait(&mut self) -> StopMode {
        match self.rx.wait_for(Option::is_some).await {
            Ok(mode) => (*mode).unwrap_or(StopMode::DetachChild),
            Err(_) => StopMode::DetachChild,
        }
    }
}

/// Stop sender held by the controller
pub struct ShutdownSender {
    tx: watch::Sender<Option<StopMode>>,
}

impl ShutdownSender {
    /// Signal stop to every task of the session
    pub fn shutdown(&self, mode: StopMode) {
        let _ = self.tx.send(Some(mode));
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(None);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
