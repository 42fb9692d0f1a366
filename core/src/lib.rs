//! Pharmaceutical sales aggregation pipeline.
//!
//! Reads the municipality directory, runs one grouped-sum query per
//! municipality with bounded retry, accumulates the rows into a single
//! table, then reports statistics and writes JSON and CSV output.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod source;
pub mod statistics;
pub mod store;
pub mod types;
