//! Track monitoring module

pub mod aggregator;

pub use aggregator::*;
