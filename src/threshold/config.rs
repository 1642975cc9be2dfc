// Threshold configuration
//
// Raw user input is normalized when it is written: percentages outside
// [0, 100] (including the conventional -1) become "disabled", the baseline
// offset is clamped into [0, u32::MAX]. Nothing here ever rejects input.

use crate::baseline::BaselineMode;
use crate::stats::LabelStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tolerance for floating-point noise in every threshold comparison
pub const THRESHOLD_TOLERANCE: f64 = 1e-8;

/// `true` when `value` exceeds `threshold` by more than [`THRESHOLD_TOLERANCE`]
pub fn exceeds(value: f64, threshold: f64) -> bool {
    value - threshold > THRESHOLD_TOLERANCE
}

/// Which evaluator judges the build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Fixed error-rate and response-time ceilings
    #[default]
    Absolute,
    /// Percentage change against a baseline build
    Relative,
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationMode::Absolute => f.write_str("absolute"),
            EvaluationMode::Relative => f.write_str("relative"),
        }
    }
}

/// Label statistic driving relative comparisons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    #[default]
    #[serde(alias = "art")]
    Average,
    #[serde(alias = "mrt")]
    Median,
    #[serde(alias = "prt", alias = "p90")]
    Percentile90,
}

impl ComparisonMetric {
    /// Read the selected statistic from a label
    pub fn select(&self, stats: &LabelStats) -> f64 {
        match self {
            ComparisonMetric::Average => stats.average,
            ComparisonMetric::Median => stats.median,
            ComparisonMetric::Percentile90 => stats.percentile90,
        }
    }

    /// Human-readable name, used as the comparison table title
    pub fn description(&self) -> &'static str {
        match self {
            ComparisonMetric::Average => "Average response time",
            ComparisonMetric::Median => "Median response time",
            ComparisonMetric::Percentile90 => "90 Percentile response time",
        }
    }

    /// Short column suffix for the comparison table
    pub fn column(&self) -> &'static str {
        match self {
            ComparisonMetric::Average => "Avg",
            ComparisonMetric::Median => "Med",
            ComparisonMetric::Percentile90 => "90%",
        }
    }
}

/// Parse `label:value` lines into a response-time threshold map
///
/// Lines that do not split into exactly two fields on `:` are dropped.
/// Values are kept as text; a non-numeric value is only reported when a
/// report actually hits it.
///
/// # Example
/// ```
/// use perfgate::threshold::parse_response_time_map;
///
/// let map = parse_response_time_map("login:500\nbadline\ncheckout:1200");
/// assert_eq!(map.len(), 2);
/// assert_eq!(map["login"], "500");
/// ```
pub fn parse_response_time_map(text: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in text.split('\n') {
        let fields: Vec<&str> = line.split(':').collect();
        if let [key, value] = fields.as_slice() {
            tracing::debug!("Setting threshold: {}:{}", key, value);
            map.insert((*key).to_string(), (*value).to_string());
        }
    }
    map
}

/// Negative disables (`-1` by convention); anything above 100 clamps to 100
fn percent_from_raw(raw: i64) -> Option<u8> {
    (raw >= 0).then(|| raw.min(100) as u8)
}

/// Negative or NaN disables; anything above 100 clamps to 100
fn band_from_raw(raw: f64) -> Option<f64> {
    (raw >= 0.0).then(|| raw.min(100.0))
}

/// Validated thresholds for one evaluation pass
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ThresholdConfig {
    mode: EvaluationMode,
    error_failed_percent: Option<u8>,
    error_unstable_percent: Option<u8>,
    response_time_thresholds: BTreeMap<String, String>,
    per_test_case: bool,
    relative_failed_positive: Option<f64>,
    relative_failed_negative: Option<f64>,
    relative_unstable_positive: Option<f64>,
    relative_unstable_negative: Option<f64>,
    comparison_metric: ComparisonMetric,
    baseline_mode: BaselineMode,
}

impl ThresholdConfig {
    /// All thresholds disabled, absolute mode, previous-build baseline
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Error percentage above which the build fails; negative disables
    pub fn with_error_failed_percent(mut self, raw: i64) -> Self {
        self.error_failed_percent = percent_from_raw(raw);
        self
    }

    /// Error percentage above which the build is unstable; negative disables
    pub fn with_error_unstable_percent(mut self, raw: i64) -> Self {
        self.error_unstable_percent = percent_from_raw(raw);
        self
    }

    /// Replace the response-time map with the entries parsed from `text`
    pub fn with_response_time_thresholds(mut self, text: &str) -> Self {
        self.response_time_thresholds = parse_response_time_map(text);
        self
    }

    /// Judge error thresholds per label instead of per report
    pub fn with_per_test_case(mut self, enabled: bool) -> Self {
        self.per_test_case = enabled;
        self
    }

    pub fn with_relative_failed_positive(mut self, raw: f64) -> Self {
        self.relative_failed_positive = band_from_raw(raw);
        self
    }

    pub fn with_relative_failed_negative(mut self, raw: f64) -> Self {
        self.relative_failed_negative = band_from_raw(raw);
        self
    }

    pub fn with_relative_unstable_positive(mut self, raw: f64) -> Self {
        self.relative_unstable_positive = band_from_raw(raw);
        self
    }

    pub fn with_relative_unstable_negative(mut self, raw: f64) -> Self {
        self.relative_unstable_negative = band_from_raw(raw);
        self
    }

    pub fn with_comparison_metric(mut self, metric: ComparisonMetric) -> Self {
        self.comparison_metric = metric;
        self
    }

    pub fn with_baseline_mode(mut self, mode: BaselineMode) -> Self {
        self.baseline_mode = mode;
        self
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    pub fn error_failed_percent(&self) -> Option<u8> {
        self.error_failed_percent
    }

    pub fn error_unstable_percent(&self) -> Option<u8> {
        self.error_unstable_percent
    }

    pub fn response_time_thresholds(&self) -> &BTreeMap<String, String> {
        &self.response_time_thresholds
    }

    pub fn per_test_case(&self) -> bool {
        self.per_test_case
    }

    pub fn relative_failed_positive(&self) -> Option<f64> {
        self.relative_failed_positive
    }

    pub fn relative_failed_negative(&self) -> Option<f64> {
        self.relative_failed_negative
    }

    pub fn relative_unstable_positive(&self) -> Option<f64> {
        self.relative_unstable_positive
    }

    pub fn relative_unstable_negative(&self) -> Option<f64> {
        self.relative_unstable_negative
    }

    pub fn comparison_metric(&self) -> ComparisonMetric {
        self.comparison_metric
    }

    pub fn baseline_mode(&self) -> BaselineMode {
        self.baseline_mode
    }

    /// Build-log preamble describing the active thresholds for the current mode
    pub fn describe(&self) -> Vec<String> {
        match self.mode {
            EvaluationMode::Absolute => vec![
                describe_error_threshold(self.error_unstable_percent, "unstable"),
                describe_error_threshold(self.error_failed_percent, "failure"),
            ],
            EvaluationMode::Relative => vec![
                describe_band(
                    self.relative_failed_negative,
                    self.relative_failed_positive,
                    "failure",
                ),
                describe_band(
                    self.relative_unstable_negative,
                    self.relative_unstable_positive,
                    "unstable",
                ),
            ],
        }
    }
}

fn describe_error_threshold(threshold: Option<u8>, severity: &str) -> String {
    match threshold {
        Some(percent) => format!(
            "Performance: Percentage of errors greater than {}% sets the build as {}",
            percent, severity
        ),
        None => format!(
            "Performance: No threshold configured for making the test {}",
            severity
        ),
    }
}

fn describe_band(negative: Option<f64>, positive: Option<f64>, severity: &str) -> String {
    if negative.is_none() && positive.is_none() {
        return format!(
            "Performance: No threshold configured for making the test {}",
            severity
        );
    }
    let side = |v: Option<f64>| v.map_or_else(|| "off".to_string(), |v| v.to_string());
    format!(
        "Performance: Percentage of relative difference outside -{} to +{} % sets the build as {}",
        side(negative),
        side(positive),
        severity
    )
}
