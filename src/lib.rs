//! CamCensus — cam model counts per country.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod server;
pub mod sources;
pub mod types;
