//! Sensor health module
//!
//! Provides the sensor registry fed by heartbeat and error signals

pub mod registry;

pub use registry::*;
