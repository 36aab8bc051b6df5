//! Data models for the railway safety monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MonitorError;

/// What the classifier saw in front of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionType {
    Animal,
    Person,
}

impl DetectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionType::Animal => "animal",
            DetectionType::Person => "person",
        }
    }

    /// Track status this detection forces while unresolved.
    pub fn track_status(&self) -> TrackStatus {
        match self {
            DetectionType::Animal => TrackStatus::Warning,
            DetectionType::Person => TrackStatus::Danger,
        }
    }
}

impl fmt::Display for DetectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionType {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "person" => Ok(DetectionType::Person),
            "animal" => Ok(DetectionType::Animal),
            other => Err(MonitorError::UnknownDetectionType(other.to_string())),
        }
    }
}

/// Sensor connectivity as reported to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    Inactive,
    Error,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Active => "active",
            SensorStatus::Inactive => "inactive",
            SensorStatus::Error => "error",
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived safety status of a track, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Safe,
    Warning,
    Danger,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Safe => "safe",
            TrackStatus::Warning => "warning",
            TrackStatus::Danger => "danger",
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, normalized classifier observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub sensor_id: String,
    #[serde(rename = "type")]
    pub detection_type: DetectionType,
    /// Integer percentage, 0-100
    pub confidence: u8,
    pub timestamp: DateTime<Utc>,
}

/// Read-only view of a sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub id: String,
    pub location: String,
    pub status: SensorStatus,
    /// Signal bars, 0-5
    pub signal_strength: u8,
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Most severe unresolved detection, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<DetectionType>,
}

/// Read-only view of a track with its derived status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub track_id: String,
    pub status: TrackStatus,
    pub sensor_ids: Vec<String>,
    pub sensor_count: usize,
    pub active_sensors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_detection: Option<DateTime<Utc>>,
}

/// Header counters of the monitoring dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_sensors: usize,
    pub active_sensors: usize,
    pub active_alerts: usize,
    pub tracks_at_risk: usize,
    /// "HIGH" when any track is in danger
    pub risk_level: String,
}
