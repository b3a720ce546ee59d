//! Shardmon - shard process monitor
//! Composition root: wires the file, system and HTTP adapters into the core
//! controller, then hands control to the operator console.

mod console;
mod logging;
mod setup;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use console::{expand_path, wait_for_failure, ExitReason};
use shardmon_core::application::supervisor::constants::GRACEFUL_SHUTDOWN_TIMEOUT;
use shardmon_core::application::{MonitorController, MonitorHandle, MonitorPorts, RestartPolicy};
use shardmon_core::port::ConfigStore;
use shardmon_core::{AppError, VERSION};
use shardmon_infra_file::{FileConfigStore, FileEventLog, FileStatusSource, IniShardNameSource};
use shardmon_infra_http::{WebhookAlertSink, DEFAULT_WEBHOOK_TIMEOUT};
use shardmon_infra_system::{InstanceLock, TokioProcessLauncher};

#[derive(Parser, Debug)]
#[command(name = "shardmon")]
#[command(about = "Keeps a shard server running and reports its status", long_about = None)]
#[command(version)]
struct Args {
    /// Monitor config file (key=value)
    #[arg(long, env = "SHARDMON_CONFIG", default_value = "config.txt")]
    config: String,

    /// Event log file
    #[arg(long, env = "SHARDMON_EVENT_LOG", default_value = "restart.log")]
    event_log: String,

    /// Single-instance pid file
    #[arg(long, env = "SHARDMON_LOCK_FILE", default_value = "shardmon.pid")]
    lock_file: String,

    /// Run without the interactive console (the shard gets stdin)
    #[arg(long, env = "SHARDMON_NO_CONSOLE")]
    no_console: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Initialize logging
    logging::init_tracing()?;
    info!("Shardmon v{} starting...", VERSION);

    // 2. Single instance guard (held until exit)
    let lock = match InstanceLock::acquire(expand_path(&args.lock_file)) {
        Ok(lock) => lock,
        Err(AppError::InstanceRunning(pid)) => {
            let message = match pid {
                Some(pid) => format!("Shard monitor is already running (pid {}).", pid),
                None => "Shard monitor is already running.".to_string(),
            };
            println!("{}", message.yellow());
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to acquire instance lock"),
    };

    // 3. Load configuration (first run prompts on stdin)
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let config_store = Arc::new(FileConfigStore::new(expand_path(&args.config)));
    let launcher = Arc::new(TokioProcessLauncher::new(
        GRACEFUL_SHUTDOWN_TIMEOUT,
        args.no_console,
    ));

    let config = if config_store.exists() {
        config_store
            .load()
            .with_context(|| format!("Failed to load {}", config_store.path().display()))?
    } else {
        setup::first_run(&mut input, launcher.as_ref(), config_store.as_ref()).await?
    };

    // 4. Setup dependencies (DI wiring)
    let event_log = Arc::new(FileEventLog::new(expand_path(&args.event_log)));
    let alert_sink = Arc::new(
        WebhookAlertSink::new(DEFAULT_WEBHOOK_TIMEOUT).context("Failed to build webhook client")?,
    );

    let ports = MonitorPorts {
        launcher,
        event_log: event_log.clone(),
        alert_sink,
        status_source: Arc::new(FileStatusSource),
        config_store,
        shard_source: Arc::new(IniShardNameSource),
    };

    let controller = MonitorController::new(config, ports, RestartPolicy::default());
    println!(
        "{} {}",
        "Monitoring shard:".bold(),
        controller.shard_name().cyan()
    );
    let handle = controller.spawn();

    // 5. Start monitoring right away
    if let Err(e) = handle.start().await {
        error!(error = %e, "Failed to start monitoring");
        println!("{}", e.to_string().red());
        if args.no_console {
            handle.shutdown().await?;
            return Err(e).context("Cannot start monitoring");
        }
    }

    // 6. Wait for quit / Ctrl+C / budget exhausted
    let reason = if args.no_console {
        wait_headless(&handle).await
    } else {
        console::run(&handle, &event_log, input).await?
    };

    match reason {
        ExitReason::AttemptsExhausted => {
            println!(
                "{}",
                "Max restart attempts reached. Monitoring stopped.".red()
            );
        }
        ExitReason::Interrupted => info!("Shutdown signal received. Exiting gracefully..."),
        ExitReason::Quit => info!("Quit requested. Exiting..."),
    }

    // 7. Graceful shutdown (stops the session with the current kill policy)
    if let Err(e) = handle.shutdown().await {
        warn!(error = %e, "Controller already stopped");
    }

    info!(log = %event_log.path().display(), "Shutdown complete.");

    // A pending stdin read cannot be cancelled and would hold the runtime open
    drop(lock);
    std::process::exit(0)
}

async fn wait_headless(handle: &MonitorHandle) -> ExitReason {
    let mut phase = handle.phase();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Ctrl+C handler failed");
            }
            ExitReason::Interrupted
        }
        _ = wait_for_failure(&mut phase) => ExitReason::AttemptsExhausted,
    }
}
