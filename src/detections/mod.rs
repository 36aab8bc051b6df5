//! Detection ingestion module

pub mod feed;

pub use feed::*;
