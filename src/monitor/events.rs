//! Monitoring events
//!
//! Event types emitted by the heartbeat sweeper for live UI updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted to the sweeper callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MonitorEvent {
    /// Sweeper started
    MonitoringStarted { interval_seconds: u64 },

    /// Sweeper stopped
    MonitoringStopped,

    /// An active sensor missed its heartbeat deadline
    SensorWentInactive {
        sensor_id: String,
        last_heartbeat: Option<DateTime<Utc>>,
    },

    /// One sweep pass finished
    SweepCompleted {
        sweep_number: u32,
        expired: usize,
        active_sensors: usize,
    },

    /// Error during a sweep
    MonitoringError { message: String },
}

/// Sweeper status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperStatus {
    pub is_running: bool,
    pub interval_seconds: u64,
    pub sweep_count: u32,
    pub last_sweep_time: Option<String>,
    pub sensors_expired: usize,
}

impl Default for SweeperStatus {
    fn default() -> Self {
        Self {
            is_running: false,
            interval_seconds: crate::config::DEFAULT_SWEEP_INTERVAL,
            sweep_count: 0,
            last_sweep_time: None,
            sensors_expired: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_string(&MonitorEvent::SensorWentInactive {
            sensor_id: "S006".to_string(),
            last_heartbeat: None,
        })
        .unwrap();

        assert!(json.contains("\"type\":\"SensorWentInactive\""));
        assert!(json.contains("\"sensor_id\":\"S006\""));
    }
}
