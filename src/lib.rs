//! Perfgate - performance test thresholds and build verdicts
//!
//! This library turns the parsed results of performance test runs into a
//! build verdict (success, unstable, failure). Reports are judged either
//! against absolute limits (error percentage, average response time) or
//! against the same labels in a baseline build chosen from the build
//! history.

pub mod archive;
pub mod baseline;
pub mod cli;
pub mod engine;
pub mod error;
pub mod gate_file;
pub mod json_output;
pub mod stats;
pub mod threshold;
