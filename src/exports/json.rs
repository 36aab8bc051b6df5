//! JSON export functionality
//!
//! Export the full dashboard snapshot and alert lists to JSON

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alerts::{Alert, AlertFilter};
use crate::engine::RailMonitor;
use crate::models::{DashboardSummary, SensorSnapshot, TrackSnapshot};

/// Point-in-time view of everything the dashboard renders
#[derive(Debug, Serialize)]
pub struct MonitorSnapshot {
    pub export_date: DateTime<Utc>,
    pub summary: DashboardSummary,
    pub tracks: Vec<TrackSnapshot>,
    pub sensors: Vec<SensorSnapshot>,
    pub alerts: Vec<Alert>,
}

impl MonitorSnapshot {
    /// Capture sensors, tracks, alerts and the summary at the monitor's clock.
    pub fn capture(monitor: &RailMonitor) -> Result<Self> {
        Ok(Self {
            export_date: monitor.now(),
            summary: monitor
                .dashboard_summary()
                .context("Failed to build dashboard summary")?,
            tracks: monitor.list_tracks().context("Failed to list tracks")?,
            sensors: monitor.list_sensors().context("Failed to list sensors")?,
            alerts: monitor
                .list_alerts(&AlertFilter::default())
                .context("Failed to list alerts")?,
        })
    }
}

/// Export a full snapshot as pretty-printed JSON
pub fn export_snapshot_json(monitor: &RailMonitor) -> Result<String> {
    let snapshot = MonitorSnapshot::capture(monitor)?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    Ok(json)
}

/// Export an alert list as pretty-printed JSON
pub fn export_alerts_json(alerts: &[Alert]) -> Result<String> {
    let json = serde_json::to_string_pretty(alerts)?;
    Ok(json)
}
