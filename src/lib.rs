//! railwatch-core: railway safety aggregation
//!
//! Turns raw trackside sensor traffic into the state a safety dashboard shows:
//! - Sensor registry with heartbeat liveness and signal strength
//! - Detection feed (person / animal) with validation
//! - Per-track status derived from unresolved detections
//! - Alert lifecycle with incident deduplication
//! - Background heartbeat sweeper with event callbacks
//! - JSON / CSV exports and the `railwatch` CLI

pub mod alerts;
pub mod app;
pub mod cli;
pub mod cli_adapter;
pub mod command;
pub mod config;
pub mod detections;
pub mod engine;
pub mod error;
pub mod exports;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod seed;
pub mod sensors;
pub mod tracks;

pub use alerts::{Alert, AlertFilter, AlertId, AlertManager, AlertOutcome, AlertStatus, IncidentKey};
pub use app::{
    AppCommandResult, AppContext, EventHook, OutputHook, execute_command_typed,
    execute_command_with_context,
};
pub use cli::CliCommand;
pub use cli_adapter::{run, run_with_context, run_with_ctrl_c};
pub use command::{AppCommand, ExportFormat};
pub use config::*;
pub use detections::{DetectionFeed, IngestOutcome, normalize_confidence};
pub use engine::{ClockHook, RailMonitor};
pub use error::{MonitorError, MonitorResult};
pub use exports::{MonitorSnapshot, export_alerts_csv, export_alerts_json, export_snapshot_json};
pub use models::*;
pub use monitor::{EventCallback, HeartbeatSweeper, MonitorEvent, SweeperStatus};
pub use seed::seed_demo_fleet;
pub use sensors::{ExpiredSensor, SensorRegistry};
pub use tracks::TrackAggregator;

// Re-export logging macros for use across crate
pub use crate::logging::macros;
