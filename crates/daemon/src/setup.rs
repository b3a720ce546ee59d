//! First-run setup: ask for the shard executable and write a fresh config

use anyhow::{bail, Context, Result};
use colored::Colorize;
use shardmon_core::domain::MonitorConfig;
use shardmon_core::port::{ConfigStore, ProcessLauncher};
use std::io::Write;
use tokio::io::{AsyncBufRead, Lines};
use tracing::{debug, info};

use crate::console::expand_path;

/// Prompt until a valid executable is entered, then save a config with
/// remote alerts disabled
pub async fn first_run<R>(
    input: &mut Lines<R>,
    launcher: &dyn ProcessLauncher,
    store: &dyn ConfigStore,
) -> Result<MonitorConfig>
where
    R: AsyncBufRead + Unpin,
{
    println!("{}", "No configuration found. First-time setup.".bold());
    print!("Enter the full path to the shard executable: ");
    let _ = std::io::stdout().flush();

    let exe_path = loop {
        let Some(line) = input
            .next_line()
            .await
            .context("Failed to read executable path")?
        else {
            bail!("Input closed before a shard executable was entered");
        };

        let path = expand_path(&line);
        match launcher.validate(&path) {
            Ok(()) => break path,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Rejected executable path");
                print!("{}", "Invalid path. Try again: ".red());
                let _ = std::io::stdout().flush();
            }
        }
    };

    let config = MonitorConfig {
        exe_path,
        use_discord: false,
        ..MonitorConfig::default()
    };
    store.save(&config).context("Failed to save config")?;
    info!(exe = %config.exe_path.display(), "First-run config saved");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardmon_core::port::config_store::mocks::MockConfigStore;
    use shardmon_core::port::process::mocks::MockProcessLauncher;
    use std::path::PathBuf;
    use tokio::io::AsyncBufReadExt;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_first_run_saves_config_with_alerts_off() {
        let store = MockConfigStore::new();
        let mut input = "/srv/shard/uox3\n".as_bytes().lines();

        let config = assert_ok!(first_run(&mut input, &MockProcessLauncher::hanging(), &store).await);

        assert_eq!(config.exe_path, PathBuf::from("/srv/shard/uox3"));
        assert!(!config.use_discord);
        assert_eq!(store.saved(), Some(config));
    }

    #[tokio::test]
    async fn test_first_run_gives_up_when_input_closes() {
        let store = MockConfigStore::new();
        let mut input = "/nope\n/still/nope\n".as_bytes().lines();

        assert_err!(first_run(&mut input, &MockProcessLauncher::invalid(), &store).await);
        assert!(store.saved().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_first_run_reprompts_until_executable() {
        use shardmon_infra_system::TokioProcessLauncher;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let exe = dir.path().join("uox3");
        std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let script = format!("{}\n{}\n", dir.path().join("missing").display(), exe.display());
        let mut input = script.as_bytes().lines();
        let store = MockConfigStore::new();

        let config = assert_ok!(first_run(&mut input, &TokioProcessLauncher::default(), &store).await);

        assert_eq!(config.exe_path, exe);
    }
}
