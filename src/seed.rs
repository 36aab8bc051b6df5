//! Demo fleet
//!
//! Populates a [`RailMonitor`] with the eight-sensor, four-track layout used
//! by the dashboard, driven entirely through the public operations so the
//! resulting state obeys the same rules as live traffic.

use chrono::{DateTime, Duration, Utc};

use crate::engine::RailMonitor;
use crate::error::MonitorResult;
use crate::models::DetectionType;

/// (sensor id, location, signal strength, seconds since last heartbeat)
const DEMO_SENSORS: [(&str, &str, u8, i64); 8] = [
    ("S001", "KM 12.3", 5, 2),
    ("S002", "KM 12.8", 4, 1),
    ("S003", "KM 13.1", 0, 300),
    ("S004", "KM 13.6", 5, 1),
    ("S005", "KM 14.2", 3, 3),
    ("S006", "KM 14.8", 2, 45),
    ("S007", "KM 15.3", 5, 2),
    ("S008", "KM 15.9", 4, 1),
];

const DEMO_TRACKS: [(&str, &[&str]); 4] = [
    ("T001", &["S001"]),
    ("T002", &["S002", "S003"]),
    ("T003", &["S004", "S005", "S006"]),
    ("T004", &["S007", "S008"]),
];

const ERROR_SENSORS: [&str; 1] = ["S003"];

#[derive(Clone, Copy)]
enum DemoFate {
    Active,
    Acknowledged,
    Resolved,
}

/// (sensor id, type, confidence, seconds ago, final state)
const DEMO_ALERTS: [(&str, DetectionType, f64, i64, DemoFate); 4] = [
    ("S004", DetectionType::Person, 94.0, 2, DemoFate::Active),
    ("S002", DetectionType::Animal, 87.0, 1_289, DemoFate::Acknowledged),
    ("S001", DetectionType::Person, 92.0, 2_802, DemoFate::Resolved),
    ("S007", DetectionType::Animal, 78.0, 5_576, DemoFate::Resolved),
];

/// Seed the demo fleet relative to `now`.
///
/// Alerts are raised in id order (A001 first). Afterwards T003 is in
/// danger, T002 in warning, and T001/T004 are safe.
pub fn seed_demo_fleet(monitor: &RailMonitor, now: DateTime<Utc>) -> MonitorResult<()> {
    for (id, location, strength, age_secs) in DEMO_SENSORS {
        monitor.register_sensor(id, location)?;
        monitor.record_heartbeat(id, strength, now - Duration::seconds(age_secs))?;
    }
    for id in ERROR_SENSORS {
        monitor.record_error(id)?;
    }

    for (track_id, sensor_ids) in DEMO_TRACKS {
        monitor.register_track(track_id)?;
        for sensor_id in sensor_ids {
            monitor.assign_sensor(track_id, sensor_id)?;
        }
    }

    for (sensor_id, kind, confidence, age_secs, fate) in DEMO_ALERTS {
        let outcome =
            monitor.ingest(sensor_id, kind, confidence, now - Duration::seconds(age_secs))?;
        let id = outcome.alert.alert_id();
        match fate {
            DemoFate::Active => {}
            DemoFate::Acknowledged => {
                monitor.acknowledge(id)?;
            }
            DemoFate::Resolved => {
                monitor.resolve(id)?;
            }
        }
    }

    tracing::info!(
        "[SEED] Demo fleet ready: {} sensors, {} tracks, {} alerts",
        DEMO_SENSORS.len(),
        DEMO_TRACKS.len(),
        DEMO_ALERTS.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertFilter, AlertId, AlertStatus};
    use crate::config::MonitorSettings;
    use crate::models::{SensorStatus, TrackStatus};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn seeded() -> RailMonitor {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 14, 45, 14).unwrap();
        let monitor = RailMonitor::new(MonitorSettings {
            heartbeat_timeout_secs: 30,
            dedup_window_secs: 300,
            sweep_interval_secs: 5,
        })
        .with_clock(Arc::new(move || now));
        seed_demo_fleet(&monitor, now).expect("demo fleet should seed");
        monitor
    }

    #[test]
    fn demo_fleet_matches_dashboard() {
        let monitor = seeded();

        assert_eq!(monitor.current_status("T001").unwrap(), TrackStatus::Safe);
        assert_eq!(monitor.current_status("T002").unwrap(), TrackStatus::Warning);
        assert_eq!(monitor.current_status("T003").unwrap(), TrackStatus::Danger);
        assert_eq!(monitor.current_status("T004").unwrap(), TrackStatus::Safe);

        assert_eq!(monitor.sensor_status("S003").unwrap(), SensorStatus::Error);
        assert_eq!(monitor.sensor_status("S006").unwrap(), SensorStatus::Inactive);

        let summary = monitor.dashboard_summary().unwrap();
        assert_eq!(summary.total_sensors, 8);
        assert_eq!(summary.active_sensors, 6);
        assert_eq!(summary.active_alerts, 1);
        assert_eq!(summary.tracks_at_risk, 1);
        assert_eq!(summary.risk_level, "HIGH");
    }

    #[test]
    fn demo_alerts_keep_ids_and_statuses() {
        let monitor = seeded();
        let alerts = monitor.list_alerts(&AlertFilter::default()).unwrap();
        let ids: Vec<String> = alerts.iter().map(|a| a.id.to_string()).collect();
        assert_eq!(ids, ["A001", "A002", "A003", "A004"]);

        assert_eq!(monitor.alert(AlertId(2)).unwrap().status, AlertStatus::Investigating);
        assert_eq!(monitor.alert(AlertId(3)).unwrap().status, AlertStatus::Resolved);
    }
}
