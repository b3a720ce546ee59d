// File EventLog Implementation
// Plain text, one "[YYYY-MM-DD HH:MM:SS] message" line per record, local time

use async_trait::async_trait;
use chrono::Local;
use shardmon_core::port::EventLog;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only event log file
///
/// Appends are serialized so concurrent writers (supervisor, poller,
/// console) never interleave within a line.
pub struct FileEventLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last `count` lines of the log, oldest first (empty if no log yet)
    pub async fn tail(&self, count: usize) -> io::Result<Vec<String>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(count);
        Ok(lines[start..].iter().map(|l| l.to_string()).collect())
    }
}

fn format_line(message: &str) -> String {
    format!("[{}] {}\n", Local::now().format(TIMESTAMP_FORMAT), message)
}

#[async_trait]
impl EventLog for FileEventLog {
    async fn append(&self, message: &str) -> io::Result<()> {
        let line = format_line(message);

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
