//! Configuration for the railway safety monitor
//!
//! Defaults are compile-time constants; every value can be tuned at runtime
//! through a `RAILWATCH_*` environment variable, clamped to a sane range.

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ====== Sensor Health ======

/// Seconds without a heartbeat before an active sensor is reported inactive.
/// The dashboard shows a sensor pinged 30s ago as offline.
pub const HEARTBEAT_TIMEOUT_SECS: u64 = 30;

/// Highest signal strength a sensor can report (bars)
pub const MAX_SIGNAL_STRENGTH: u8 = 5;

// ====== Alerts ======

/// Seconds within which repeated detections fold into the open alert
pub const DEDUP_WINDOW_SECS: u64 = 300;

/// Upper bound on a detection confidence (percent)
pub const MAX_CONFIDENCE: f64 = 100.0;

// ====== Background Sweeper ======

/// Default interval between heartbeat sweeps in seconds
pub const DEFAULT_SWEEP_INTERVAL: u64 = 5;

/// Minimum sweep interval in seconds
pub const MIN_SWEEP_INTERVAL: u64 = 1;

/// Maximum sweep interval in seconds
pub const MAX_SWEEP_INTERVAL: u64 = 3600;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse_u64(name: &str, default: u64, min: u64, max: u64) -> u64 {
    match env_var(name).and_then(|v| v.parse::<u64>().ok()) {
        Some(v) => v.clamp(min, max),
        None => default,
    }
}

/// Runtime-tunable heartbeat timeout.
/// Env: `RAILWATCH_HEARTBEAT_TIMEOUT_SECS`
pub fn heartbeat_timeout_secs() -> u64 {
    env_parse_u64(
        "RAILWATCH_HEARTBEAT_TIMEOUT_SECS",
        HEARTBEAT_TIMEOUT_SECS,
        1,
        86_400,
    )
}

/// Runtime-tunable alert dedup window.
/// Env: `RAILWATCH_DEDUP_WINDOW_SECS`
pub fn dedup_window_secs() -> u64 {
    env_parse_u64("RAILWATCH_DEDUP_WINDOW_SECS", DEDUP_WINDOW_SECS, 1, 86_400)
}

/// Runtime-tunable sweep interval.
/// Env: `RAILWATCH_SWEEP_INTERVAL_SECS`
pub fn sweep_interval_secs() -> u64 {
    env_parse_u64(
        "RAILWATCH_SWEEP_INTERVAL_SECS",
        DEFAULT_SWEEP_INTERVAL,
        MIN_SWEEP_INTERVAL,
        MAX_SWEEP_INTERVAL,
    )
}

// ====== Logging ======

/// Filter directive used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Optional log directory override.
/// Env: `RAILWATCH_LOG_DIR`
pub fn log_dir_override() -> Option<String> {
    env_var("RAILWATCH_LOG_DIR")
}

/// Runtime monitor settings (env-driven).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub heartbeat_timeout_secs: u64,
    pub dedup_window_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_env()
    }
}

impl MonitorSettings {
    pub fn from_env() -> Self {
        Self {
            heartbeat_timeout_secs: heartbeat_timeout_secs(),
            dedup_window_secs: dedup_window_secs(),
            sweep_interval_secs: sweep_interval_secs(),
        }
    }

    pub fn heartbeat_timeout(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.heartbeat_timeout_secs as i64)
    }

    pub fn dedup_window(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.dedup_window_secs as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_convert_seconds_to_durations() {
        let settings = MonitorSettings {
            heartbeat_timeout_secs: 30,
            dedup_window_secs: 300,
            sweep_interval_secs: 5,
        };

        assert_eq!(settings.heartbeat_timeout(), ChronoDuration::seconds(30));
        assert_eq!(settings.dedup_window(), ChronoDuration::minutes(5));
        assert_eq!(settings.sweep_interval(), Duration::from_secs(5));
    }

    #[test]
    fn unset_env_falls_back_to_default() {
        assert_eq!(
            env_parse_u64("RAILWATCH_TEST_UNSET_VARIABLE", 42, 1, 100),
            42
        );
    }
}
