//! Real-time monitoring module
//!
//! Provides the background heartbeat sweeper and its event stream

pub mod events;
pub mod watcher;

pub use events::*;
pub use watcher::*;
