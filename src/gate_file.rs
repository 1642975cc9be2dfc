//! Gate file parser (perfgate.toml)
//!
//! The gate file holds the thresholds a pipeline applies to its performance
//! reports. Raw values are read as written and normalized into a
//! [`ThresholdConfig`]: a negative percentage (conventionally `-1`) disables
//! the threshold, one above `100` is clamped to `100`, and a negative
//! `nth_build` is clamped to `0`.
//!
//! # Example perfgate.toml
//!
//! ```toml
//! mode = "absolute"
//!
//! [absolute]
//! error_unstable_percent = 5
//! error_failed_percent = 20
//! response_time_thresholds = """
//! login.jtl:500
//! checkout.jtl:1200
//! """
//!
//! [relative]
//! unstable_positive = 30
//! failed_positive = 60
//! unstable_negative = -1
//! failed_negative = -1
//! metric = "median"
//! nth_build = 3
//! ```

use crate::baseline::BaselineMode;
use crate::threshold::{ComparisonMetric, EvaluationMode, ThresholdConfig};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

fn disabled_percent() -> i64 {
    -1
}

fn disabled_band() -> f64 {
    -1.0
}

/// `[absolute]` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AbsoluteSection {
    #[serde(default = "disabled_percent")]
    pub error_failed_percent: i64,

    #[serde(default = "disabled_percent")]
    pub error_unstable_percent: i64,

    /// Newline-separated `report:millis` lines
    #[serde(default)]
    pub response_time_thresholds: String,

    /// Apply error thresholds to every label instead of the report aggregate
    #[serde(default)]
    pub per_test_case: bool,
}

impl Default for AbsoluteSection {
    fn default() -> Self {
        Self {
            error_failed_percent: disabled_percent(),
            error_unstable_percent: disabled_percent(),
            response_time_thresholds: String::new(),
            per_test_case: false,
        }
    }
}

/// `[relative]` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RelativeSection {
    #[serde(default = "disabled_band")]
    pub failed_positive: f64,

    #[serde(default = "disabled_band")]
    pub failed_negative: f64,

    #[serde(default = "disabled_band")]
    pub unstable_positive: f64,

    #[serde(default = "disabled_band")]
    pub unstable_negative: f64,

    #[serde(default)]
    pub metric: ComparisonMetric,

    /// Compare against the build this many steps back; absent means the previous build
    #[serde(default)]
    pub nth_build: Option<i64>,
}

impl Default for RelativeSection {
    fn default() -> Self {
        Self {
            failed_positive: disabled_band(),
            failed_negative: disabled_band(),
            unstable_positive: disabled_band(),
            unstable_negative: disabled_band(),
            metric: ComparisonMetric::default(),
            nth_build: None,
        }
    }
}

/// Root of perfgate.toml
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GateFile {
    #[serde(default)]
    pub mode: EvaluationMode,

    #[serde(default)]
    pub absolute: AbsoluteSection,

    #[serde(default)]
    pub relative: RelativeSection,
}

impl GateFile {
    /// Load a gate file from disk
    ///
    /// # Example
    ///
    /// ```no_run
    /// use perfgate::gate_file::GateFile;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = GateFile::from_file("perfgate.toml")?.to_config();
    /// println!("{:?} mode", config.mode());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid gate file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Normalize raw values into a threshold configuration
    pub fn to_config(&self) -> ThresholdConfig {
        let baseline = match self.relative.nth_build {
            Some(n) => BaselineMode::nth_from_raw(n),
            None => BaselineMode::PreviousBuild,
        };

        ThresholdConfig::new()
            .with_mode(self.mode)
            .with_error_failed_percent(self.absolute.error_failed_percent)
            .with_error_unstable_percent(self.absolute.error_unstable_percent)
            .with_response_time_thresholds(&self.absolute.response_time_thresholds)
            .with_per_test_case(self.absolute.per_test_case)
            .with_relative_failed_positive(self.relative.failed_positive)
            .with_relative_failed_negative(self.relative.failed_negative)
            .with_relative_unstable_positive(self.relative.unstable_positive)
            .with_relative_unstable_negative(self.relative.unstable_negative)
            .with_comparison_metric(self.relative.metric)
            .with_baseline_mode(baseline)
    }
}
