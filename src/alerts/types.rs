//! Alert types for railway safety monitoring
//!
//! Defines alert identity, lifecycle status and query filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Detection, DetectionType};

/// Monotonic alert identifier, displayed as `A001`, `A002`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{:03}", self.0)
    }
}

/// Alert lifecycle: active -> investigating -> resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Just raised, nobody has looked at it
    Active,
    /// Acknowledged by an operator
    Investigating,
    /// Terminal
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Investigating => "investigating",
            AlertStatus::Resolved => "resolved",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, AlertStatus::Resolved)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(AlertStatus::Active),
            "investigating" => Some(AlertStatus::Investigating),
            "resolved" => Some(AlertStatus::Resolved),
            _ => None,
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle-tracked detection incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    /// Latest detection folded into this alert
    pub timestamp: DateTime<Utc>,
    /// Earliest detection folded into this alert
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub detection_type: DetectionType,
    pub track_id: String,
    pub sensor_id: String,
    /// Highest confidence seen, 0-100
    pub confidence: u8,
    pub status: AlertStatus,
}

impl Alert {
    pub fn new(id: AlertId, track_id: impl Into<String>, detection: &Detection) -> Self {
        Self {
            id,
            timestamp: detection.timestamp,
            created_at: detection.timestamp,
            detection_type: detection.detection_type,
            track_id: track_id.into(),
            sensor_id: detection.sensor_id.clone(),
            confidence: detection.confidence,
            status: AlertStatus::Active,
        }
    }

    pub fn matches_incident(&self, key: &IncidentKey) -> bool {
        self.detection_type == key.detection_type
            && self.sensor_id == key.sensor_id
            && self.track_id == key.track_id
    }

    pub fn incident_key(&self) -> IncidentKey {
        IncidentKey {
            track_id: self.track_id.clone(),
            sensor_id: self.sensor_id.clone(),
            detection_type: self.detection_type,
        }
    }
}

/// Identity of an ongoing incident used for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncidentKey {
    pub track_id: String,
    pub sensor_id: String,
    pub detection_type: DetectionType,
}

impl IncidentKey {
    pub fn new(track_id: &str, detection: &Detection) -> Self {
        Self {
            track_id: track_id.to_string(),
            sensor_id: detection.sensor_id.clone(),
            detection_type: detection.detection_type,
        }
    }
}

impl fmt::Display for IncidentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.track_id, self.sensor_id, self.detection_type
        )
    }
}

/// Result of feeding a detection into the alert manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "alert_id", rename_all = "snake_case")]
pub enum AlertOutcome {
    /// A new alert was raised
    Created(AlertId),
    /// The detection folded into an open alert
    Updated(AlertId),
}

impl AlertOutcome {
    pub fn alert_id(&self) -> AlertId {
        match self {
            AlertOutcome::Created(id) | AlertOutcome::Updated(id) => *id,
        }
    }
}

/// Optional filters for alert listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub detection_type: Option<DetectionType>,
}

impl AlertFilter {
    pub fn with_status(mut self, status: AlertStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_type(mut self, detection_type: DetectionType) -> Self {
        self.detection_type = Some(detection_type);
        self
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.status.is_none_or(|s| s == alert.status)
            && self
                .detection_type
                .is_none_or(|t| t == alert.detection_type)
    }
}
