// Monitor Configuration Model
// Flat key=value text: the on-disk contract shared with older monitor installs

use std::path::PathBuf;

use super::error::{DomainError, Result};

/// Lower bound for the status poll interval (bounds alert volume)
pub const MIN_STATUS_INTERVAL_SECS: u64 = 10;

const DEFAULT_INI_PATH: &str = "uox3.ini";
const DEFAULT_STATUS_HTML_PATH: &str = "serverstatus.html";
const DEFAULT_STATUS_INTERVAL_SECS: u64 = 60;

const KEY_EXE_PATH: &str = "exePath";
const KEY_INI_PATH: &str = "iniPath";
const KEY_USE_DISCORD: &str = "useDiscord";
const KEY_DISCORD_WEBHOOK: &str = "discordWebhook";
const KEY_STATUS_HTML_PATH: &str = "statusHtmlPath";
const KEY_HTML_STATUS_ENABLED: &str = "htmlStatusEnabled";
const KEY_HTML_STATUS_INTERVAL: &str = "htmlStatusInterval";

/// Operator configuration, loaded once and handed to each monitoring session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Server executable to supervise
    pub exe_path: PathBuf,
    /// Server INI holding the shard name
    pub ini_path: PathBuf,
    /// Remote (webhook) alerting switch
    pub use_discord: bool,
    pub discord_webhook: String,
    /// Status artifact rewritten by the server
    pub status_html_path: PathBuf,
    pub html_status_enabled: bool,
    /// Poll interval in seconds, never below MIN_STATUS_INTERVAL_SECS after load
    pub html_status_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            exe_path: PathBuf::new(),
            ini_path: PathBuf::from(DEFAULT_INI_PATH),
            use_discord: false,
            discord_webhook: String::new(),
            status_html_path: PathBuf::from(DEFAULT_STATUS_HTML_PATH),
            html_status_enabled: true,
            html_status_interval_secs: DEFAULT_STATUS_INTERVAL_SECS,
        }
    }
}

/// Path-valued settings the operator may change at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSetting {
    Executable,
    Ini,
    StatusHtml,
}

impl std::fmt::Display for PathSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSetting::Executable => write!(f, "executable"),
            PathSetting::Ini => write!(f, "INI"),
            PathSetting::StatusHtml => write!(f, "HTML status"),
        }
    }
}

impl MonitorConfig {
    /// Parse key=value text on top of the defaults
    ///
    /// Keys are matched case-insensitively; lines without `=` and unknown
    /// keys are ignored. Never fails: garbage falls back to defaults.
    pub fn from_kv_text(text: &str) -> Self {
        let mut config = Self::default();

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "exepath" => config.exe_path = PathBuf::from(value),
                "inipath" => config.ini_path = PathBuf::from(value),
                "usediscord" => config.use_discord = parse_bool(value),
                "discordwebhook" => config.discord_webhook = value.to_string(),
                "statushtmlpath" => config.status_html_path = PathBuf::from(value),
                "htmlstatusenabled" => config.html_status_enabled = parse_bool(value),
                "htmlstatusinterval" => {
                    config.html_status_interval_secs = parse_interval(value);
                }
                _ => {}
            }
        }

        config
    }

    /// Render all seven keys in their canonical order
    pub fn to_kv_text(&self) -> String {
        let lines = [
            format!("{}={}", KEY_EXE_PATH, self.exe_path.display()),
            format!("{}={}", KEY_INI_PATH, self.ini_path.display()),
            format!("{}={}", KEY_USE_DISCORD, self.use_discord),
            format!("{}={}", KEY_DISCORD_WEBHOOK, self.discord_webhook),
            format!("{}={}", KEY_STATUS_HTML_PATH, self.status_html_path.display()),
            format!("{}={}", KEY_HTML_STATUS_ENABLED, self.html_status_enabled),
            format!("{}={}", KEY_HTML_STATUS_INTERVAL, self.html_status_interval_secs),
        ];

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Webhook endpoint, if remote alerting is switched on and configured
    pub fn alert_endpoint(&self) -> Option<&str> {
        let endpoint = self.discord_webhook.trim();
        (self.use_discord && !endpoint.is_empty()).then_some(endpoint)
    }

    /// Replace one of the path settings
    pub fn set_path(&mut self, setting: PathSetting, path: PathBuf) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(DomainError::ValidationError(format!(
                "{} path must not be empty",
                setting
            )));
        }

        match setting {
            PathSetting::Executable => self.exe_path = path,
            PathSetting::Ini => self.ini_path = path,
            PathSetting::StatusHtml => self.status_html_path = path,
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn parse_interval(value: &str) -> u64 {
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| u64::try_from(secs).ok())
        .unwrap_or(0)
        .max(MIN_STATUS_INTERVAL_SECS)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
