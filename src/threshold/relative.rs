// Relative (baseline) threshold evaluation
//
// Labels from the current build are matched case-insensitively against
// labels from the baseline build and the selected metric's percentage
// change is checked against asymmetric bands: increases against the
// positive bands, decreases (by magnitude) against the negative bands.
//
// Matching is a plain O(n*m) cross product over the flattened label lists.
// A label that appears in several reports is compared once per pairing;
// nothing is deduplicated.

use crate::stats::{LabelStats, Report};
use crate::threshold::config::{exceeds, ComparisonMetric, ThresholdConfig};
use crate::threshold::verdict::{BuildVerdict, Verdict};
use serde::Serialize;
use std::fmt;

/// Round to two decimals, halves rounding up
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Percentage change of a metric relative to its baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RelativeChange {
    /// Rounded to two decimals
    Percent(f64),
    /// Baseline was zero and current is not: an unbounded increase
    Unbounded,
}

impl RelativeChange {
    /// Change from `baseline` to `current`
    ///
    /// A zero baseline never divides: `0 -> 0` is no change, `0 -> x` is
    /// [`RelativeChange::Unbounded`].
    pub fn between(baseline: f64, current: f64) -> Self {
        if baseline == 0.0 {
            if current == 0.0 {
                RelativeChange::Percent(0.0)
            } else {
                RelativeChange::Unbounded
            }
        } else {
            RelativeChange::Percent(round2((current - baseline) * 100.0 / baseline))
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, RelativeChange::Percent(p) if *p < 0.0)
    }

    /// Absolute size of the change; infinite when unbounded
    pub fn magnitude(&self) -> f64 {
        match self {
            RelativeChange::Percent(p) => p.abs(),
            RelativeChange::Unbounded => f64::INFINITY,
        }
    }
}

impl fmt::Display for RelativeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeChange::Percent(p) => write!(f, "{:.2}", p),
            RelativeChange::Unbounded => f.write_str("+inf"),
        }
    }
}

/// One matched label pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelComparison {
    pub baseline_label: String,
    pub current_label: String,
    pub baseline_value: f64,
    pub current_value: f64,
    pub delta: f64,
    pub change: RelativeChange,
    /// Candidate produced by this pair alone
    pub verdict: Verdict,
}

/// Comparison table and offending labels from a relative pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelativeOutcome {
    pub comparisons: Vec<LabelComparison>,
    /// First label whose change failed the build
    pub failed_label: Option<String>,
    /// First label whose change made the build unstable
    pub unstable_label: Option<String>,
    /// `true` when the baseline had no labels and nothing was compared
    pub skipped: bool,
}

impl RelativeOutcome {
    /// Failure label if any, else the unstable label
    pub fn offending_label(&self) -> Option<&str> {
        self.failed_label
            .as_deref()
            .or(self.unstable_label.as_deref())
    }

    /// Tab-separated comparison table for the build log
    pub fn table(&self, metric: ComparisonMetric) -> Vec<String> {
        let rule = "=".repeat(132);
        let col = metric.column();
        let mut lines = vec![
            metric.description().to_string(),
            rule.clone(),
            format!(
                "BaselineLabel\tCurrentLabel\t\tBaseline{}\t\tCurrent{}\tRelativeDiff\tRelativeDiffPercentage",
                col, col
            ),
            rule,
        ];
        for row in &self.comparisons {
            lines.push(format!(
                "{}\t{}\t\t{}\t\t\t{}\t\t\t{}\t\t{}",
                row.baseline_label,
                row.current_label,
                row.baseline_value,
                row.current_value,
                row.delta,
                row.change
            ));
        }
        lines.push("-".repeat(132));
        lines
    }

    /// "The label ... caused the build to fail" style summary, if any label triggered
    pub fn summary(&self) -> Option<String> {
        if let Some(label) = &self.failed_label {
            Some(format!("The label \"{}\" caused the build to fail", label))
        } else {
            self.unstable_label
                .as_ref()
                .map(|label| format!("The label \"{}\" made the build unstable", label))
        }
    }
}

/// Compares current labels against baseline labels
pub struct RelativeEvaluator<'a> {
    config: &'a ThresholdConfig,
}

impl<'a> RelativeEvaluator<'a> {
    pub fn new(config: &'a ThresholdConfig) -> Self {
        Self { config }
    }

    /// Compare every matching label pair, raising `verdict` pair by pair
    pub fn evaluate(
        &self,
        current: &[Report],
        baseline: &[Report],
        verdict: &mut BuildVerdict,
    ) -> RelativeOutcome {
        let current_labels = flatten(current);
        let baseline_labels = flatten(baseline);

        let mut outcome = RelativeOutcome::default();
        if baseline_labels.is_empty() {
            tracing::info!("Baseline has no labels, skipping relative comparison");
            outcome.skipped = true;
            return outcome;
        }

        let metric = self.config.comparison_metric();
        for b in &baseline_labels {
            for c in &current_labels {
                if !b.matches(c) {
                    continue;
                }

                let row = self.compare(b, c, metric);
                match row.verdict {
                    Verdict::Failure if outcome.failed_label.is_none() => {
                        outcome.failed_label = Some(b.label.clone());
                    }
                    Verdict::Unstable if outcome.unstable_label.is_none() => {
                        outcome.unstable_label = Some(b.label.clone());
                    }
                    _ => {}
                }
                verdict.raise(row.verdict);
                outcome.comparisons.push(row);
            }
        }

        tracing::debug!(
            "Compared {} label pairs ({} baseline x {} current)",
            outcome.comparisons.len(),
            baseline_labels.len(),
            current_labels.len()
        );
        outcome
    }

    fn compare(
        &self,
        baseline: &LabelStats,
        current: &LabelStats,
        metric: ComparisonMetric,
    ) -> LabelComparison {
        let baseline_value = metric.select(baseline);
        let current_value = metric.select(current);
        let change = RelativeChange::between(baseline_value, current_value);

        LabelComparison {
            baseline_label: baseline.label.clone(),
            current_label: current.label.clone(),
            baseline_value,
            current_value,
            delta: current_value - baseline_value,
            change,
            verdict: self.classify(change),
        }
    }

    /// Failure band first, then unstable band, on the side given by the sign
    fn classify(&self, change: RelativeChange) -> Verdict {
        let (failed, unstable) = if change.is_negative() {
            (
                self.config.relative_failed_negative(),
                self.config.relative_unstable_negative(),
            )
        } else {
            (
                self.config.relative_failed_positive(),
                self.config.relative_unstable_positive(),
            )
        };

        let magnitude = change.magnitude();
        let over = |band: Option<f64>| band.is_some_and(|b| exceeds(magnitude, b));

        if over(failed) {
            Verdict::Failure
        } else if over(unstable) {
            Verdict::Unstable
        } else {
            Verdict::Success
        }
    }
}

fn flatten(reports: &[Report]) -> Vec<&LabelStats> {
    reports.iter().flat_map(|r| r.labels()).collect()
}
