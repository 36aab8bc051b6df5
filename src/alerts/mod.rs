//! Alerts system module
//!
//! Provides alert creation, deduplication and lifecycle transitions

pub mod lifecycle;
pub mod types;

pub use lifecycle::*;
pub use types::*;
