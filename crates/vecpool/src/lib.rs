//! vecpool library — configuration, workload driver and report output for
//! the `vecpool` binary.

pub mod app;
pub mod config;
pub mod errors;
pub mod output;
pub mod workload;
