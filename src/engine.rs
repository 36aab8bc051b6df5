//! Rail monitor facade
//!
//! Wires the sensor registry, detection feed, track aggregator and alert
//! manager together and exposes the read-only snapshot queries the
//! dashboard consumes.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::alerts::{Alert, AlertFilter, AlertId, AlertManager, AlertStatus};
use crate::config::MonitorSettings;
use crate::detections::{DetectionFeed, IngestOutcome};
use crate::error::MonitorResult;
use crate::models::{
    DashboardSummary, DetectionType, SensorSnapshot, SensorStatus, TrackSnapshot, TrackStatus,
};
use crate::sensors::{ExpiredSensor, SensorRegistry};
use crate::tracks::TrackAggregator;

/// Source of "now" for heartbeat expiry and sensor availability checks
pub type ClockHook = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared handle to the whole monitoring core. Cloning is cheap.
#[derive(Clone)]
pub struct RailMonitor {
    settings: MonitorSettings,
    sensors: Arc<SensorRegistry>,
    tracks: Arc<TrackAggregator>,
    alerts: Arc<AlertManager>,
    feed: Arc<DetectionFeed>,
    clock: ClockHook,
}

impl Default for RailMonitor {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RailMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        let sensors = Arc::new(SensorRegistry::new(settings.heartbeat_timeout()));
        let tracks = Arc::new(TrackAggregator::new(Arc::clone(&sensors)));
        let alerts = Arc::new(AlertManager::new(
            settings.dedup_window(),
            Arc::clone(&tracks),
        ));
        let feed = Arc::new(DetectionFeed::new(
            Arc::clone(&sensors),
            Arc::clone(&tracks),
            Arc::clone(&alerts),
        ));

        Self {
            settings,
            sensors,
            tracks,
            alerts,
            feed,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn from_env() -> Self {
        Self::new(MonitorSettings::from_env())
    }

    pub fn with_clock(mut self, clock: ClockHook) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // ====== Sensors ======

    pub fn register_sensor(
        &self,
        id: impl Into<String>,
        location: impl Into<String>,
    ) -> MonitorResult<()> {
        self.sensors.register_sensor(id, location)
    }

    pub fn record_heartbeat(
        &self,
        id: &str,
        signal_strength: u8,
        timestamp: DateTime<Utc>,
    ) -> MonitorResult<()> {
        self.sensors.record_heartbeat(id, signal_strength, timestamp)
    }

    pub fn record_error(&self, id: &str) -> MonitorResult<()> {
        self.sensors.record_error(id)
    }

    pub fn sensor_status(&self, id: &str) -> MonitorResult<SensorStatus> {
        self.sensors.status(id, self.now())
    }

    /// Persist heartbeat expiry as of the monitor clock.
    pub fn expire_stale_sensors(&self) -> MonitorResult<Vec<ExpiredSensor>> {
        self.sensors.expire_stale(self.now())
    }

    // ====== Tracks ======

    pub fn register_track(&self, id: impl Into<String>) -> MonitorResult<()> {
        self.tracks.register_track(id)
    }

    pub fn assign_sensor(&self, track_id: &str, sensor_id: &str) -> MonitorResult<()> {
        self.tracks.assign_sensor(track_id, sensor_id)
    }

    pub fn current_status(&self, track_id: &str) -> MonitorResult<TrackStatus> {
        self.tracks.current_status(track_id)
    }

    // ====== Detections & Alerts ======

    /// Ingest one classifier detection.
    pub fn ingest(
        &self,
        sensor_id: &str,
        detection_type: DetectionType,
        confidence: f64,
        timestamp: DateTime<Utc>,
    ) -> MonitorResult<IngestOutcome> {
        self.feed
            .ingest(sensor_id, detection_type, confidence, timestamp, self.now())
    }

    pub fn acknowledge(&self, alert_id: AlertId) -> MonitorResult<Alert> {
        self.alerts.acknowledge(alert_id)
    }

    /// Resolve an alert. Once no open alert remains for its incident, the
    /// sensor's detection of that type is cleared and the track recovers.
    pub fn resolve(&self, alert_id: AlertId) -> MonitorResult<Alert> {
        let key = self.alerts.get(alert_id)?.incident_key();
        self.alerts.with_incident(&key, || {
            let resolved = self.alerts.resolve(alert_id)?;
            if !self.alerts.has_open_incident(&key)?
                && self
                    .sensors
                    .clear_detection(&key.sensor_id, key.detection_type)?
            {
                tracing::info!(
                    "[ALERTS] Cleared {} detection on {} (track {})",
                    key.detection_type,
                    key.sensor_id,
                    key.track_id
                );
            }
            Ok(resolved)
        })
    }

    pub fn alert(&self, alert_id: AlertId) -> MonitorResult<Alert> {
        self.alerts.get(alert_id)
    }

    // ====== Snapshots ======

    pub fn list_sensors(&self) -> MonitorResult<Vec<SensorSnapshot>> {
        self.sensors.list(self.now())
    }

    pub fn list_tracks(&self) -> MonitorResult<Vec<TrackSnapshot>> {
        self.tracks.list(self.now())
    }

    pub fn list_alerts(&self, filter: &AlertFilter) -> MonitorResult<Vec<Alert>> {
        self.alerts.list(filter)
    }

    /// Header counters of the dashboard.
    pub fn dashboard_summary(&self) -> MonitorResult<DashboardSummary> {
        let sensors = self.list_sensors()?;
        let tracks = self.list_tracks()?;
        let active_alerts = self
            .list_alerts(&AlertFilter::default().with_status(AlertStatus::Active))?
            .len();

        let tracks_at_risk = tracks
            .iter()
            .filter(|t| t.status == TrackStatus::Danger)
            .count();

        Ok(DashboardSummary {
            total_sensors: sensors.len(),
            active_sensors: sensors
                .iter()
                .filter(|s| s.status == SensorStatus::Active)
                .count(),
            active_alerts,
            tracks_at_risk,
            risk_level: if tracks_at_risk > 0 { "HIGH" } else { "LOW" }.to_string(),
        })
    }

    pub(crate) fn sensors(&self) -> &Arc<SensorRegistry> {
        &self.sensors
    }
}
