//! Error types for the safety monitor core.

use thiserror::Error;

use crate::alerts::{AlertId, AlertStatus};

/// Validation failures surfaced synchronously by monitor operations.
///
/// Every operation either applies fully or fails with one of these and
/// leaves sensor, track and alert state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// Sensor id was never registered
    #[error("unknown sensor: {0}")]
    UnknownSensor(String),

    /// Track id was never registered
    #[error("unknown track: {0}")]
    UnknownTrack(String),

    /// Alert id does not exist
    #[error("unknown alert: {0}")]
    UnknownAlert(AlertId),

    /// Sensor is not part of any track (or not of the requested one)
    #[error("sensor {sensor_id} is not assigned to {}", track_id.as_deref().unwrap_or("any track"))]
    SensorNotAssigned {
        sensor_id: String,
        track_id: Option<String>,
    },

    /// Sensor already belongs to a different track
    #[error("sensor {sensor_id} is already assigned to track {track_id}")]
    SensorAlreadyAssigned { sensor_id: String, track_id: String },

    /// Detection came from a sensor that is inactive or in error
    #[error("sensor {0} is not active")]
    SensorUnavailable(String),

    #[error("sensor already registered: {0}")]
    DuplicateSensor(String),

    #[error("track already registered: {0}")]
    DuplicateTrack(String),

    /// Alert is terminal
    #[error("alert {0} is already resolved")]
    AlreadyResolved(AlertId),

    /// Forward transition not allowed from the current status
    #[error("alert {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: AlertId,
        from: AlertStatus,
        to: AlertStatus,
    },

    /// Confidence outside [0, 100] or not a number
    #[error("invalid confidence {0}: expected a value between 0 and 100")]
    InvalidConfidence(String),

    #[error("unknown detection type: {0}")]
    UnknownDetectionType(String),

    /// A lock was poisoned by a panicking writer
    #[error("{0} state lock poisoned")]
    StatePoisoned(&'static str),
}

pub type MonitorResult<T> = std::result::Result<T, MonitorError>;
