//! Interactive operator console
//!
//! One command per line on stdin. Runs until `quit`, Ctrl+C, or the
//! supervisor giving up on the shard.

use anyhow::Result;
use colored::Colorize;
use shardmon_core::application::{MonitorHandle, MonitorStatus};
use shardmon_core::domain::{PathSetting, SupervisorPhase};
use shardmon_infra_file::FileEventLog;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::watch;
use tracing::{info, warn};

const DEFAULT_TAIL_LINES: usize = 20;

/// Why the monitor is shutting down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    Interrupted,
    AttemptsExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    ToggleKill,
    Status,
    SetPath(PathSetting, PathBuf),
    Log(usize),
    Help,
    Quit,
}

/// Parse one console line; `Ok(None)` for a blank line
pub fn parse_command(line: &str) -> std::result::Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "start" => ConsoleCommand::Start,
        "stop" => ConsoleCommand::Stop,
        "toggle-kill" => ConsoleCommand::ToggleKill,
        "status" => ConsoleCommand::Status,
        "set-exe" => ConsoleCommand::SetPath(PathSetting::Executable, require_path(word, rest)?),
        "set-ini" => ConsoleCommand::SetPath(PathSetting::Ini, require_path(word, rest)?),
        "set-html" => ConsoleCommand::SetPath(PathSetting::StatusHtml, require_path(word, rest)?),
        "log" => {
            let count = if rest.is_empty() {
                DEFAULT_TAIL_LINES
            } else {
                rest.parse::<usize>()
                    .map_err(|_| format!("log expects a line count, got '{}'", rest))?
            };
            ConsoleCommand::Log(count)
        }
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };

    Ok(Some(command))
}

fn require_path(word: &str, rest: &str) -> std::result::Result<PathBuf, String> {
    if rest.is_empty() {
        return Err(format!("{} expects a path", word));
    }
    Ok(expand_path(rest))
}

/// Strip surrounding quotes and expand a leading `~`
pub fn expand_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim().trim_matches('"');
    PathBuf::from(shellexpand::tilde(trimmed).into_owned())
}

/// Wait until the supervisor reports it gave up
pub async fn wait_for_failure(phase: &mut watch::Receiver<SupervisorPhase>) {
    if phase
        .wait_for(|p| matches!(p, SupervisorPhase::Failed { .. }))
        .await
        .is_err()
    {
        // Controller gone: nothing left to observe
        std::future::pending::<()>().await;
    }
}

/// Read and execute commands until the monitor should exit
pub async fn run<R>(
    handle: &MonitorHandle,
    event_log: &FileEventLog,
    mut input: Lines<R>,
) -> Result<ExitReason>
where
    R: AsyncBufRead + Unpin,
{
    let mut phase = handle.phase();
    let mut input_open = true;
    print_help();

    loop {
        if input_open {
            prompt();
        }

        tokio::select! {
            line = input.next_line(), if input_open => {
                match line? {
                    Some(line) => match parse_command(&line) {
                        Ok(Some(ConsoleCommand::Quit)) => return Ok(ExitReason::Quit),
                        Ok(Some(command)) => execute(handle, event_log, command).await?,
                        Ok(None) => {}
                        Err(message) => println!("{}", message.red()),
                    },
                    None => {
                        info!("Console input closed, monitoring continues until Ctrl+C");
                        input_open = false;
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Ctrl+C handler failed");
                }
                return Ok(ExitReason::Interrupted);
            }
            _ = wait_for_failure(&mut phase) => {
                return Ok(ExitReason::AttemptsExhausted);
            }
        }
    }
}

async fn execute(
    handle: &MonitorHandle,
    event_log: &FileEventLog,
    command: ConsoleCommand,
) -> Result<()> {
    match command {
        ConsoleCommand::Start => match handle.start().await {
            Ok(()) => println!("{}", "Monitoring started.".green()),
            Err(e) => println!("{}", e.to_string().red()),
        },
        ConsoleCommand::Stop => match handle.stop().await? {
            Some(_) => println!("{}", "Monitoring stopped.".yellow()),
            None => println!("Monitoring is not active."),
        },
        ConsoleCommand::ToggleKill => {
            if handle.toggle_kill_on_stop().await? {
                println!("Will kill shard on Stop.");
            } else {
                println!("Will NOT kill shard on Stop.");
            }
        }
        ConsoleCommand::Status => print_status(&handle.status().await?),
        ConsoleCommand::SetPath(setting, path) => {
            match handle.set_path(setting, path.clone()).await {
                Ok(()) => println!(
                    "{} path set to {} (applies on next start)",
                    setting,
                    path.display()
                ),
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        ConsoleCommand::Log(count) => match event_log.tail(count).await {
            Ok(lines) if lines.is_empty() => println!("(event log is empty)"),
            Ok(lines) => lines.iter().for_each(|l| println!("{}", l)),
            Err(e) => println!("{}", format!("Cannot read event log: {}", e).red()),
        },
        ConsoleCommand::Help => print_help(),
        // Handled by the loop
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

fn print_status(status: &MonitorStatus) {
    let phase = status.phase.to_string();
    let phase = match status.phase {
        SupervisorPhase::Running { .. } => phase.green(),
        SupervisorPhase::Failed { .. } => phase.red(),
        SupervisorPhase::Exited { .. } | SupervisorPhase::Restarting { .. } => phase.yellow(),
        _ => phase.normal(),
    };

    println!("{}", "Shard Monitor Status".bold());
    println!("  Shard:          {}", status.shard_name);
    println!("  Executable:     {}", status.exe_path.display());
    println!("  Phase:          {}", phase);
    println!("  Monitoring:     {}", if status.active { "active" } else { "inactive" });
    println!(
        "  Kill on stop:   {}",
        if status.allow_kill_on_stop { "yes" } else { "no" }
    );
    println!(
        "  Status polling: {}",
        if status.status_polling { "enabled" } else { "disabled" }
    );
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  start              Start monitoring the shard");
    println!("  stop               Stop monitoring (kills the shard unless toggled)");
    println!("  toggle-kill        Toggle whether stop kills the shard");
    println!("  status             Show monitor status");
    println!("  set-exe <path>     Set the shard executable");
    println!("  set-ini <path>     Set the shard INI (reloads the shard name)");
    println!("  set-html <path>    Set the HTML status file");
    println!("  log [n]            Show the last n event log lines");
    println!("  help               Show this help");
    println!("  quit               Stop monitoring and exit");
}

fn prompt() {
    print!("{} ", ">".cyan());
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("start"), Ok(Some(ConsoleCommand::Start)));
        assert_eq!(parse_command("  STOP  "), Ok(Some(ConsoleCommand::Stop)));
        assert_eq!(parse_command("toggle-kill"), Ok(Some(ConsoleCommand::ToggleKill)));
        assert_eq!(parse_command("exit"), Ok(Some(ConsoleCommand::Quit)));
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn test_parse_set_path_keeps_spaces_and_strips_quotes() {
        assert_eq!(
            parse_command(r#"set-exe "/srv/my shard/uox3""#),
            Ok(Some(ConsoleCommand::SetPath(
                PathSetting::Executable,
                PathBuf::from("/srv/my shard/uox3")
            )))
        );
        assert_eq!(
            parse_command("set-html /var/www/status.html"),
            Ok(Some(ConsoleCommand::SetPath(
                PathSetting::StatusHtml,
                PathBuf::from("/var/www/status.html")
            )))
        );
    }

    #[test]
    fn test_parse_set_path_requires_argument() {
        assert!(parse_command("set-ini").is_err());
    }

    #[test]
    fn test_parse_log_count() {
        assert_eq!(parse_command("log"), Ok(Some(ConsoleCommand::Log(20))));
        assert_eq!(parse_command("log 5"), Ok(Some(ConsoleCommand::Log(5))));
        assert!(parse_command("log many").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_command("restart-now").unwrap_err();
        assert!(err.contains("restart-now"));
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/shard/uox3");
        assert!(expanded.ends_with("shard/uox3"));
        if std::env::var_os("HOME").is_some() {
            assert!(!expanded.starts_with("~"));
        }
        assert_eq!(expand_path("\"/opt/uox3\""), PathBuf::from("/opt/uox3"));
    }
}
