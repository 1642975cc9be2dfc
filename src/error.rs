//! Recoverable evaluation errors
//!
//! None of these abort an evaluation pass. Each step returns them as values;
//! the pass records them as diagnostics and carries on with whatever data it
//! still has.

use crate::baseline::BuildRef;
use crate::stats::ReportError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Threshold set to a non-number [{value}] for report {report}")]
    NonNumericThreshold { report: String, value: String },

    #[error("no {name} reports have been found")]
    MissingReports { name: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed report {}: {source}", path.display())]
    MalformedReport {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    InvalidReport(#[from] ReportError),

    #[error("baseline build {build} has no stored reports")]
    EmptyBaseline { build: BuildRef },
}

/// Result type for evaluation steps
pub type Result<T> = std::result::Result<T, EvalError>;
