//! Export functionality for dashboard data
//!
//! Provides JSON snapshot and CSV alert-history exports

pub mod csv;
pub mod json;

pub use csv::*;
pub use json::*;
