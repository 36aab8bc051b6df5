//! Detection classifier feed
//!
//! Validates raw classifier output, normalizes it into a [`Detection`] and
//! forwards it to the track aggregator and the alert manager. Nothing is
//! retried here; a rejected detection must be resubmitted by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::{AlertManager, AlertOutcome, IncidentKey};
use crate::config::MAX_CONFIDENCE;
use crate::error::{MonitorError, MonitorResult};
use crate::models::{Detection, DetectionType, TrackStatus};
use crate::sensors::SensorRegistry;
use crate::tracks::TrackAggregator;

/// What a single accepted detection changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub detection: Detection,
    pub track_id: String,
    pub track_status: TrackStatus,
    pub alert: AlertOutcome,
}

/// Round a raw confidence to an integer percentage, rejecting anything outside [0, 100].
pub fn normalize_confidence(raw: f64) -> MonitorResult<u8> {
    if !raw.is_finite() || !(0.0..=MAX_CONFIDENCE).contains(&raw) {
        return Err(MonitorError::InvalidConfidence(raw.to_string()));
    }
    Ok(raw.round() as u8)
}

pub struct DetectionFeed {
    sensors: Arc<SensorRegistry>,
    tracks: Arc<TrackAggregator>,
    alerts: Arc<AlertManager>,
}

impl DetectionFeed {
    pub fn new(
        sensors: Arc<SensorRegistry>,
        tracks: Arc<TrackAggregator>,
        alerts: Arc<AlertManager>,
    ) -> Self {
        Self {
            sensors,
            tracks,
            alerts,
        }
    }

    /// Validate a raw detection without touching any state.
    ///
    /// The sensor must be registered, active at `now` and assigned to a track.
    pub fn validate(
        &self,
        sensor_id: &str,
        detection_type: DetectionType,
        confidence: f64,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> MonitorResult<(Detection, String)> {
        let confidence = normalize_confidence(confidence)?;
        self.sensors.ensure_available(sensor_id, now)?;
        let track_id = self.tracks.track_for_sensor(sensor_id)?;

        Ok((
            Detection {
                sensor_id: sensor_id.to_string(),
                detection_type,
                confidence,
                timestamp,
            },
            track_id,
        ))
    }

    /// Ingest one detection. Arrival order is not enforced; the latest
    /// timestamp wins per sensor and per alert.
    pub fn ingest(
        &self,
        sensor_id: &str,
        detection_type: DetectionType,
        confidence: f64,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> MonitorResult<IngestOutcome> {
        let (detection, track_id) =
            match self.validate(sensor_id, detection_type, confidence, timestamp, now) {
                Ok(validated) => validated,
                Err(e) => {
                    tracing::warn!("[FEED] Rejected detection from {}: {}", sensor_id, e);
                    return Err(e);
                }
            };

        let key = IncidentKey::new(&track_id, &detection);
        let (track_status, alert) = self.alerts.with_incident(&key, || {
            self.sensors.record_detection(&detection)?;
            let (_, track_status) = self.tracks.on_detection(&detection)?;
            let alert = self.alerts.create_or_update(&key, &detection)?;
            Ok((track_status, alert))
        })?;

        tracing::debug!(
            "[FEED] {} {} @ {}% -> track {} {}",
            detection.sensor_id,
            detection.detection_type,
            detection.confidence,
            track_id,
            track_status
        );

        Ok(IngestOutcome {
            detection,
            track_id,
            track_status,
            alert,
        })
    }
}
