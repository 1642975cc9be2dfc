//! Per-label and per-report latency statistics
//!
//! These are the already-parsed aggregates produced by a report parser
//! (JMeter, JUnit, ...). The evaluators only read them: a [`Report`] is
//! validated once in [`Report::new`] and exposes no mutating methods.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised when report data breaks the parser contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("report '{report}': duplicate label '{label}'")]
    DuplicateLabel { report: String, label: String },

    #[error("report '{report}': label '{label}' has invalid {field} value {value}")]
    InvalidValue {
        report: String,
        label: String,
        field: &'static str,
        value: f64,
    },
}

/// Statistics for a single request label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    /// Logical request name (endpoint, transaction, ...)
    pub label: String,
    /// Average response time (ms)
    pub average: f64,
    /// Median response time (ms)
    pub median: f64,
    /// 90th percentile response time (ms)
    #[serde(rename = "percentile90")]
    pub percentile90: f64,
    /// Percentage of failed samples, 0-100
    pub error_percent: f64,
    /// Number of samples behind these figures (0 when unknown)
    #[serde(default)]
    pub samples: u64,
}

impl LabelStats {
    /// Create label statistics without a sample count
    pub fn new(
        label: impl Into<String>,
        average: f64,
        median: f64,
        percentile90: f64,
        error_percent: f64,
    ) -> Self {
        Self {
            label: label.into(),
            average,
            median,
            percentile90,
            error_percent,
            samples: 0,
        }
    }

    /// Attach a sample count (used to weight report aggregates)
    pub fn with_samples(mut self, samples: u64) -> Self {
        self.samples = samples;
        self
    }

    /// Case-insensitive label comparison
    pub fn matches(&self, other: &LabelStats) -> bool {
        self.label.to_lowercase() == other.label.to_lowercase()
    }

    fn check(&self, report: &str) -> Result<(), ReportError> {
        let fields = [
            ("average", self.average),
            ("median", self.median),
            ("percentile90", self.percentile90),
            ("error_percent", self.error_percent),
        ];
        for (field, value) in fields {
            let out_of_range = field == "error_percent" && value > 100.0;
            if !value.is_finite() || value < 0.0 || out_of_range {
                return Err(ReportError::InvalidValue {
                    report: report.to_string(),
                    label: self.label.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawReport {
    source_name: String,
    #[serde(default)]
    labels: Vec<LabelStats>,
}

/// Aggregated statistics for one parsed report file
///
/// Label order is the parser's insertion order and is never re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReport")]
pub struct Report {
    source_name: String,
    labels: Vec<LabelStats>,
    overall_error_percent: f64,
    overall_average: f64,
}

impl TryFrom<RawReport> for Report {
    type Error = ReportError;

    fn try_from(raw: RawReport) -> Result<Self, Self::Error> {
        Report::new(raw.source_name, raw.labels)
    }
}

impl Report {
    /// Build a report, validating labels and computing the aggregates
    ///
    /// Labels must be unique under the same case-insensitive rule used for
    /// matching against a baseline.
    ///
    /// Aggregates are sample-weighted when any label carries a sample count,
    /// otherwise a plain mean over labels. An empty report aggregates to zero.
    pub fn new(
        source_name: impl Into<String>,
        labels: Vec<LabelStats>,
    ) -> Result<Self, ReportError> {
        let source_name = source_name.into();

        let mut seen = HashSet::with_capacity(labels.len());
        for stats in &labels {
            stats.check(&source_name)?;
            if !seen.insert(stats.label.to_lowercase()) {
                return Err(ReportError::DuplicateLabel {
                    report: source_name,
                    label: stats.label.clone(),
                });
            }
        }

        let (overall_error_percent, overall_average) = aggregate(&labels);

        Ok(Self {
            source_name,
            labels,
            overall_error_percent,
            overall_average,
        })
    }

    /// Report identity, used for logging and response-time threshold lookup
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Labels in parser order
    pub fn labels(&self) -> &[LabelStats] {
        &self.labels
    }

    /// Percentage of failed samples across the whole report
    pub fn overall_error_percent(&self) -> f64 {
        self.overall_error_percent
    }

    /// Average response time across the whole report (ms)
    pub fn overall_average(&self) -> f64 {
        self.overall_average
    }

    /// Total number of samples (0 when the parser did not report counts)
    pub fn total_samples(&self) -> u64 {
        total_samples(&self.labels)
    }
}

/// Saturates instead of overflowing on absurd sample counts
fn total_samples(labels: &[LabelStats]) -> u64 {
    labels
        .iter()
        .fold(0u64, |total, l| total.saturating_add(l.samples))
}

fn aggregate(labels: &[LabelStats]) -> (f64, f64) {
    if labels.is_empty() {
        return (0.0, 0.0);
    }

    let total = total_samples(labels);
    if total > 0 {
        let weight = |l: &LabelStats| l.samples as f64 / total as f64;
        let errors = labels.iter().map(|l| l.error_percent * weight(l)).sum();
        let average = labels.iter().map(|l| l.average * weight(l)).sum();
        (errors, average)
    } else {
        let n = labels.len() as f64;
        let errors = labels.iter().map(|l| l.error_percent).sum::<f64>() / n;
        let average = labels.iter().map(|l| l.average).sum::<f64>() / n;
        (errors, average)
    }
}
