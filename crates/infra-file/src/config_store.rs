// File ConfigStore Implementation
// key=value text file, rewritten whole on every save

use shardmon_core::domain::MonitorConfig;
use shardmon_core::error::{AppError, Result};
use shardmon_core::port::ConfigStore;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<MonitorConfig> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::ConfigMissing(self.path.clone()),
            _ => AppError::Io(e),
        })?;

        let config = MonitorConfig::from_kv_text(&text);
        debug!(path = %self.path.display(), "Config loaded");
        Ok(config)
    }

    fn save(&self, config: &MonitorConfig) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, config.to_kv_text())?;
        info!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    #[test]
    fn test_missing_file_reports_config_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path().join("config.txt"));

        assert!(!store.exists());
        assert!(matches!(store.load(), Err(AppError::ConfigMissing(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path().join("nested/config.txt"));
        let config = MonitorConfig {
            exe_path: PathBuf::from("/srv/shard/uox3"),
            use_discord: true,
            discord_webhook: "https://hooks.test/a=b".to_string(),
            html_status_interval_secs: 30,
            ..Default::default()
        };

        assert_ok!(store.save(&config));

        assert!(store.exists());
        assert_eq!(assert_ok!(store.load()), config);
    }

    #[test]
    fn test_hand_edited_file_is_lenient() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(
            &path,
            "EXEPATH=/opt/uox3\nnonsense line\nhtmlStatusInterval=abc\nUseDiscord=TRUE\n",
        )
        .unwrap();

        let config = FileConfigStore::new(&path).load().unwrap();

        assert_eq!(config.exe_path, PathBuf::from("/opt/uox3"));
        assert_eq!(config.html_status_interval_secs, 10);
        assert!(config.use_discord);
    }
}
