// File StatusSource Implementation

use async_trait::async_trait;
use shardmon_core::port::StatusSource;
use std::io;
use std::path::Path;

/// Reads the status page the shard writes to disk
///
/// Bytes are decoded lossily: a page caught mid-rewrite still parses,
/// it just yields unknown counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStatusSource;

#[async_trait]
impl StatusSource for FileStatusSource {
    async fn read_status(&self, path: &Path) -> io::Result<Option<String>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardmon_core::domain::{StatusLabels, StatusSnapshot};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let result = FileStatusSource
            .read_status(&dir.path().join("serverstatus.html"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_reads_page_with_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("serverstatus.html");
        let mut bytes = b"<p><em>Player:</em> 12</p>\xff\xfe".to_vec();
        bytes.extend_from_slice(b"<p><em>GMs:</em> 2</p><p><em>Counselors:</em> 1</p>");
        std::fs::write(&path, bytes).unwrap();

        let text = FileStatusSource.read_status(&path).await.unwrap().unwrap();

        assert_eq!(
            StatusSnapshot::parse(&text, &StatusLabels::default()),
            StatusSnapshot::new(12, 2, 1)
        );
    }

    #[tokio::test]
    async fn test_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(FileStatusSource.read_status(dir.path()).await.is_err());
    }
}
