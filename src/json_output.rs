//! JSON output format for evaluation outcomes
//!
//! `--format json` writes one document per run so pipelines can pick up the
//! verdict and the comparison table without scraping the text log.

use crate::engine::EvaluationOutcome;
use crate::threshold::{EvaluationMode, LabelComparison, Verdict};
use serde::Serialize;

/// Top-level JSON document
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutcome {
    pub version: String,
    pub build: u32,
    pub mode: EvaluationMode,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_build: Option<u32>,
    /// Failure label if any, else the unstable label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offending_label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comparisons: Vec<LabelComparison>,
    pub log: Vec<String>,
    pub diagnostics: Vec<String>,
}

impl From<&EvaluationOutcome> for JsonOutcome {
    fn from(outcome: &EvaluationOutcome) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            build: outcome.build.number,
            mode: outcome.mode,
            verdict: outcome.verdict,
            baseline_build: outcome.baseline.map(|b| b.number),
            offending_label: outcome.offending_label().map(str::to_string),
            comparisons: outcome
                .relative
                .as_ref()
                .map(|r| r.comparisons.clone())
                .unwrap_or_default(),
            log: outcome.log.clone(),
            diagnostics: outcome.diagnostics.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl JsonOutcome {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
