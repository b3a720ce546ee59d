//! Unit tests for config text parsing

use super::*;

#[test]
fn test_defaults_when_empty() {
    let config = MonitorConfig::from_kv_text("");
    assert_eq!(config, MonitorConfig::default());
    assert_eq!(config.ini_path, PathBuf::from("uox3.ini"));
    assert_eq!(config.html_status_interval_secs, 60);
    assert!(config.html_status_enabled);
    assert!(!config.use_discord);
}

#[test]
fn test_round_trip_all_fields() {
    let config = MonitorConfig {
        exe_path: PathBuf::from("/srv/shard/uox3"),
        ini_path: PathBuf::from("/srv/shard/uox3.ini"),
        use_discord: true,
        discord_webhook: "https://hooks.example.com/api/webhooks/1/abc".to_string(),
        status_html_path: PathBuf::from("/srv/shard/html/serverstatus.html"),
        html_status_enabled: false,
        html_status_interval_secs: 45,
    };

    let reloaded = MonitorConfig::from_kv_text(&config.to_kv_text());
    assert_eq!(reloaded, config);
}

#[test]
fn test_saved_booleans_are_lowercase() {
    let config = MonitorConfig {
        use_discord: true,
        ..Default::default()
    };

    let text = config.to_kv_text();
    assert!(text.contains("useDiscord=true\n"));
    assert!(text.contains("htmlStatusEnabled=true\n"));
    assert_eq!(text.lines().count(), 7);
    assert!(text.starts_with("exePath="));
}

#[test]
fn test_keys_and_booleans_case_insensitive() {
    let config = MonitorConfig::from_kv_text("USEDISCORD=TRUE\nHtmlStatusEnabled=False\n");
    assert!(config.use_discord);
    assert!(!config.html_status_enabled);
}

#[test]
fn test_interval_clamped_on_load() {
    let config = MonitorConfig::from_kv_text("htmlStatusInterval=3");
    assert_eq!(config.html_status_interval_secs, MIN_STATUS_INTERVAL_SECS);

    let config = MonitorConfig::from_kv_text("htmlStatusInterval=-20");
    assert_eq!(config.html_status_interval_secs, MIN_STATUS_INTERVAL_SECS);

    let config = MonitorConfig::from_kv_text("htmlStatusInterval=soon");
    assert_eq!(config.html_status_interval_secs, MIN_STATUS_INTERVAL_SECS);
}

#[test]
fn test_unknown_keys_and_malformed_lines_ignored() {
    let text = "# comment\ntheme=dark\nexePath = /opt/uox3 \nnot a pair\n";
    let config = MonitorConfig::from_kv_text(text);
    assert_eq!(config.exe_path, PathBuf::from("/opt/uox3"));
    assert_eq!(config.ini_path, PathBuf::from("uox3.ini"));
}

#[test]
fn test_value_may_contain_equals() {
    let config = MonitorConfig::from_kv_text("discordWebhook=https://x.test/hook?a=b");
    assert_eq!(config.discord_webhook, "https://x.test/hook?a=b");
}

#[test]
fn test_alert_endpoint_requires_switch_and_url() {
    let mut config = MonitorConfig {
        discord_webhook: "https://x.test/hook".to_string(),
        ..Default::default()
    };
    assert_eq!(config.alert_endpoint(), None);

    config.use_discord = true;
    assert_eq!(config.alert_endpoint(), Some("https://x.test/hook"));

    config.discord_webhook = "   ".to_string();
    assert_eq!(config.alert_endpoint(), None);
}

#[test]
fn test_set_path_rejects_empty() {
    let mut config = MonitorConfig::default();
    let result = config.set_path(PathSetting::Ini, PathBuf::new());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("must not be empty"));

    config
        .set_path(PathSetting::StatusHtml, PathBuf::from("/tmp/status.html"))
        .unwrap();
    assert_eq!(config.status_html_path, PathBuf::from("/tmp/status.html"));
}
