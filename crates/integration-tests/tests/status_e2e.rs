//! Status polling end-to-end: real status file, real poll loop
#![cfg(unix)]

use shardmon_integration_tests::{eventually, Harness};
use std::time::Duration;

const PAGE: &str = "<html><body>\
<p><em>Player:</em> 5</p>\
<p><em>GMs:</em> 1</p>\
<p><em>Counselors:</em> 0</p>\
</body></html>";

#[tokio::test]
async fn test_first_poll_reports_counters_once() {
    let h = Harness::new("exec sleep 30", Duration::from_millis(50), true);
    std::fs::write(h.path("serverstatus.html"), PAGE).unwrap();

    h.handle.start().await.unwrap();

    let sink = h.sink.clone();
    assert!(eventually(Duration::from_secs(5), || sink.count_containing("Status Update") == 1).await);

    let update = h
        .sink
        .messages()
        .into_iter()
        .find(|m| m.contains("Status Update"))
        .unwrap();
    assert!(update.starts_with("Britannia Status Update:"));
    assert!(update.contains("Players: 5"));
    assert!(update.contains("GMs: 1"));
    assert!(update.contains("Counselors: 0"));

    h.handle.stop().await.unwrap();
    let lines = h.log_lines().await;
    assert!(lines.iter().any(|l| l.contains("[HTML Timer] Monitoring every 10s")));
    assert!(lines.iter().any(|l| l.contains("Stopped HTML status timer.")));
}

#[tokio::test]
async fn test_missing_status_file_is_logged_not_alerted() {
    let h = Harness::new("exec sleep 30", Duration::from_millis(50), true);

    h.handle.start().await.unwrap();

    let log_path = h.path("restart.log");
    assert!(
        eventually(Duration::from_secs(5), || {
            std::fs::read_to_string(&log_path)
                .map(|text| text.contains("[HTML Timer] File not found"))
                .unwrap_or(false)
        })
        .await
    );

    h.handle.stop().await.unwrap();
    assert_eq!(h.sink.count_containing("Status Update"), 0);
}

#[tokio::test]
async fn test_disabled_polling_never_alerts() {
    let h = Harness::new("exec sleep 30", Duration::from_millis(50), false);
    std::fs::write(h.path("serverstatus.html"), PAGE).unwrap();

    h.handle.start().await.unwrap();
    let log_path = h.path("restart.log");
    assert!(
        eventually(Duration::from_secs(5), || {
            std::fs::read_to_string(&log_path)
                .map(|text| text.contains("[HTML Timer] Disabled by config."))
                .unwrap_or(false)
        })
        .await
    );
    h.handle.stop().await.unwrap();

    assert_eq!(h.sink.count_containing("Status Update"), 0);
}
