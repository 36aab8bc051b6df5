use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use railwatch_core::{
    AppContext, CliCommand, ExportFormat, MonitorSettings, OutputHook, RailMonitor,
    execute_command_with_context, run_with_context, seed_demo_fleet,
};

fn demo_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 14, 45, 14)
        .single()
        .expect("fixed timestamp should be valid")
}

fn make_test_context() -> (AppContext, Arc<Mutex<Vec<String>>>) {
    let now = demo_now();
    let monitor = RailMonitor::new(MonitorSettings {
        heartbeat_timeout_secs: 30,
        dedup_window_secs: 300,
        sweep_interval_secs: 5,
    })
    .with_clock(Arc::new(move || now));
    seed_demo_fleet(&monitor, now).expect("demo fleet should seed");

    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let output_hook: OutputHook = Arc::new(move |line| {
        sink.lock()
            .expect("output lock should not be poisoned")
            .push(line.to_string());
    });

    (AppContext::new(monitor).with_output_hook(output_hook), lines)
}

fn joined(lines: &Arc<Mutex<Vec<String>>>) -> String {
    lines
        .lock()
        .expect("output lock should not be poisoned")
        .join("\n")
}

#[tokio::test]
async fn help_command_writes_usage_to_output_hook() {
    let (context, lines) = make_test_context();

    execute_command_with_context(CliCommand::Help, &context)
        .await
        .expect("help command should succeed");

    let output = joined(&lines);
    assert!(output.contains("Usage:"));
    assert!(output.contains("railwatch alerts"));
}

#[tokio::test]
async fn summary_reports_demo_fleet_counters() {
    let (context, lines) = make_test_context();

    execute_command_with_context(CliCommand::Summary, &context)
        .await
        .expect("summary should succeed");

    let parsed: serde_json::Value =
        serde_json::from_str(&joined(&lines)).expect("summary output should be valid JSON");
    assert_eq!(parsed["total_sensors"], 8);
    assert_eq!(parsed["active_sensors"], 6);
    assert_eq!(parsed["active_alerts"], 1);
    assert_eq!(parsed["tracks_at_risk"], 1);
    assert_eq!(parsed["risk_level"], "HIGH");
}

#[tokio::test]
async fn snapshot_outputs_tracks_with_derived_status() {
    let (context, lines) = make_test_context();

    execute_command_with_context(CliCommand::Snapshot, &context)
        .await
        .expect("snapshot should succeed");

    let parsed: serde_json::Value =
        serde_json::from_str(&joined(&lines)).expect("snapshot output should be valid JSON");
    let statuses: Vec<&str> = parsed["tracks"]
        .as_array()
        .expect("tracks should be an array")
        .iter()
        .filter_map(|t| t["status"].as_str())
        .collect();
    assert_eq!(statuses, ["safe", "warning", "danger", "safe"]);
    assert_eq!(
        parsed["sensors"]
            .as_array()
            .expect("sensors should be an array")
            .len(),
        8
    );
}

#[tokio::test]
async fn alerts_csv_respects_status_filter() {
    let (context, lines) = make_test_context();

    execute_command_with_context(
        CliCommand::Alerts {
            status: Some(railwatch_core::AlertStatus::Resolved),
            detection_type: None,
            format: ExportFormat::Csv,
        },
        &context,
    )
    .await
    .expect("alerts export should succeed");

    let output = joined(&lines);
    let rows: Vec<&str> = output.lines().collect();
    assert_eq!(rows.len(), 3, "header plus two resolved alerts");
    assert!(rows[1].starts_with("A003,"));
    assert!(rows[2].starts_with("A004,"));
}

#[tokio::test]
async fn cli_args_dispatch_through_context() {
    let (context, lines) = make_test_context();

    run_with_context(
        ["railwatch", "alerts", "--type", "person", "--status", "active"],
        &context,
    )
    .await
    .expect("cli dispatch should succeed");

    let parsed: serde_json::Value =
        serde_json::from_str(&joined(&lines)).expect("alerts output should be valid JSON");
    let alerts = parsed.as_array().expect("alerts should be an array");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["sensor_id"], "S004");
    assert_eq!(alerts[0]["confidence"], 94);
}

#[tokio::test]
async fn invalid_cli_args_are_rejected_before_dispatch() {
    let (context, lines) = make_test_context();

    let err = run_with_context(["railwatch", "alerts", "--format", "xml"], &context)
        .await
        .expect_err("unknown format should fail");
    assert!(err.to_string().contains("Invalid value for --format"));
    assert!(joined(&lines).is_empty());
}
