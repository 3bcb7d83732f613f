//! Export through the session API.

mod common;

use common::{ScriptedProber, ip, monitor, wait_for_cycles};
use live_ping_monitor::export::ExportFormat;
use live_ping_monitor::{MonitorError, SessionState};

#[tokio::test(start_paused = true)]
async fn exports_reflect_the_committed_snapshot() {
    let prober = ScriptedProber::new(Some(12));
    prober.script(ip("10.0.0.9"), &[None]);
    let monitor = monitor(prober);
    monitor.start("10.0.0.9, 10.0.0.1").unwrap();
    monitor.on_hostname_resolved(ip("10.0.0.1"), Some("router.lan"));
    wait_for_cycles(monitor.session(), 1).await;

    let csv = monitor.export_csv().unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], "10.0.0.1,router.lan,online,12.0,12.0,12.0,12.0,0.0,1,1");
    assert_eq!(rows[2], "10.0.0.9,,offline,,,,,100.0,1,0");

    let text = monitor.export_text();
    assert!(text.find("Host: 10.0.0.1") < text.find("Host: 10.0.0.9"));
    assert!(text.contains("Hostname: router.lan"));
}

#[tokio::test(start_paused = true)]
async fn export_failure_does_not_touch_the_session() {
    let monitor = monitor(ScriptedProber::new(Some(1)));
    monitor.start("10.0.0.1").unwrap();
    wait_for_cycles(monitor.session(), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let err = monitor.export_to_dir(&missing, ExportFormat::Text).unwrap_err();
    assert!(matches!(err, MonitorError::Export(_)));
    assert_eq!(monitor.state(), SessionState::Running);

    let path = monitor.export_to_dir(dir.path(), ExportFormat::Csv).unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));
    assert!(std::fs::read_to_string(path).unwrap().contains("10.0.0.1"));
}
