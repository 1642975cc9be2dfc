// Absolute threshold evaluation
//
// Each report is judged on its own against fixed ceilings: error percentage
// (per report, or per label in per-test-case mode) and an optional average
// response time keyed by the report's source name.

use crate::error::EvalError;
use crate::stats::Report;
use crate::threshold::config::{exceeds, ThresholdConfig};
use crate::threshold::verdict::{BuildVerdict, Verdict};

/// Build-log lines and recoverable errors from an absolute pass
#[derive(Debug, Default)]
pub struct AbsoluteOutcome {
    /// One block of lines per processed report
    pub log: Vec<String>,
    /// Non-fatal problems (e.g. non-numeric response-time thresholds)
    pub diagnostics: Vec<EvalError>,
}

/// Compares reports against fixed error and response-time ceilings
pub struct AbsoluteEvaluator<'a> {
    config: &'a ThresholdConfig,
}

impl<'a> AbsoluteEvaluator<'a> {
    pub fn new(config: &'a ThresholdConfig) -> Self {
        Self { config }
    }

    /// Evaluate every report, raising `verdict` as candidates are produced
    pub fn evaluate(&self, reports: &[Report], verdict: &mut BuildVerdict) -> AbsoluteOutcome {
        let mut outcome = AbsoluteOutcome::default();
        for report in reports {
            self.evaluate_report(report, verdict, &mut outcome);
        }
        outcome
    }

    /// Evaluate one report and merge its candidate into `verdict`
    pub fn evaluate_report(
        &self,
        report: &Report,
        verdict: &mut BuildVerdict,
        outcome: &mut AbsoluteOutcome,
    ) -> Verdict {
        let mut candidate = if self.config.per_test_case() {
            self.per_label_errors(report, &mut outcome.log)
        } else {
            self.error_candidate(report.overall_error_percent())
        };

        let average = report.overall_average();
        outcome.log.push(format!(
            "{} has an average of: {}",
            report.source_name(),
            average
        ));

        if let Some(raw) = self
            .config
            .response_time_thresholds()
            .get(report.source_name())
        {
            match raw.parse::<i64>() {
                Ok(threshold) if threshold as f64 <= average => {
                    outcome.log.push(format!(
                        "UNSTABLE: {} has exceeded the threshold of [{}] with the time of [{}]",
                        report.source_name(),
                        threshold,
                        average
                    ));
                    candidate = candidate.merge(Verdict::Unstable);
                }
                Ok(_) => {}
                Err(_) => {
                    let err = EvalError::NonNumericThreshold {
                        report: report.source_name().to_string(),
                        value: raw.clone(),
                    };
                    tracing::warn!("{}", err);
                    outcome.log.push(format!("ERROR: {}", err));
                    outcome.diagnostics.push(err);
                    candidate = Verdict::Failure;
                }
            }
        }

        let build = verdict.raise(candidate);
        outcome.log.push(format!(
            "Performance: File {} reported {}% of errors [{}]. Build status is: {}",
            report.source_name(),
            report.overall_error_percent(),
            candidate,
            build
        ));
        candidate
    }

    /// Failure check first, then unstable; disabled thresholds never trigger
    fn error_candidate(&self, error_percent: f64) -> Verdict {
        let over = |threshold: Option<u8>| {
            threshold.is_some_and(|t| exceeds(error_percent, f64::from(t)))
        };

        if over(self.config.error_failed_percent()) {
            Verdict::Failure
        } else if over(self.config.error_unstable_percent()) {
            Verdict::Unstable
        } else {
            Verdict::Success
        }
    }

    fn per_label_errors(&self, report: &Report, log: &mut Vec<String>) -> Verdict {
        let mut candidate = Verdict::Success;
        for stats in report.labels() {
            let label_verdict = self.error_candidate(stats.error_percent);
            if label_verdict != Verdict::Success {
                log.push(format!(
                    "Performance: Label {} in {} reported {}% of errors [{}]",
                    stats.label,
                    report.source_name(),
                    stats.error_percent,
                    label_verdict
                ));
            }
            candidate = candidate.merge(label_verdict);
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::LabelStats;

    fn report(name: &str, error_percent: f64, average: f64) -> Report {
        Report::new(
            name,
            vec![LabelStats::new("all", average, average, average, error_percent)],
        )
        .unwrap()
    }

    fn run(config: &ThresholdConfig, reports: &[Report]) -> (Verdict, AbsoluteOutcome) {
        let mut verdict = BuildVerdict::new();
        let outcome = AbsoluteEvaluator::new(config).evaluate(reports, &mut verdict);
        (verdict.get(), outcome)
    }

    #[test]
    fn test_error_equal_to_failure_threshold_does_not_fail() {
        let config = ThresholdConfig::new().with_error_failed_percent(20);
        let (verdict, _) = run(&config, &[report("r.jtl", 20.0, 10.0)]);
        assert_eq!(verdict, Verdict::Success);
    }

    #[test]
    fn test_error_just_above_failure_threshold_fails() {
        let config = ThresholdConfig::new().with_error_failed_percent(20);
        let (verdict, _) = run(&config, &[report("r.jtl", 20.001, 10.0)]);
        assert_eq!(verdict, Verdict::Failure);
    }

    #[test]
    fn test_disabled_failure_threshold_never_fails() {
        for raw in [-1, 101, 1000] {
            let config = ThresholdConfig::new().with_error_failed_percent(raw);
            let (verdict, _) = run(&config, &[report("r.jtl", 100.0, 10.0)]);
            assert_eq!(verdict, Verdict::Success, "raw threshold {}", raw);
        }
    }

    #[test]
    fn test_unstable_threshold() {
        let config = ThresholdConfig::new()
            .with_error_failed_percent(20)
            .with_error_unstable_percent(5);
        let (verdict, outcome) = run(&config, &[report("r.jtl", 10.0, 10.0)]);
        assert_eq!(verdict, Verdict::Unstable);
        assert!(outcome
            .log
            .iter()
            .any(|l| l.contains("reported 10% of errors [UNSTABLE]")));
    }

    #[test]
    fn test_failure_takes_priority_over_unstable() {
        let config = ThresholdConfig::new()
            .with_error_failed_percent(20)
            .with_error_unstable_percent(5);
        let (verdict, _) = run(&config, &[report("r.jtl", 50.0, 10.0)]);
        assert_eq!(verdict, Verdict::Failure);
    }

    #[test]
    fn test_response_time_threshold_only_reaches_unstable() {
        let config = ThresholdConfig::new().with_response_time_thresholds("r.jtl:500");
        let (verdict, outcome) = run(&config, &[report("r.jtl", 0.0, 5000.0)]);
        assert_eq!(verdict, Verdict::Unstable);
        assert!(outcome
            .log
            .iter()
            .any(|l| l.starts_with("UNSTABLE: r.jtl has exceeded the threshold of [500]")));
    }

    #[test]
    fn test_response_time_threshold_is_inclusive() {
        let config = ThresholdConfig::new().with_response_time_thresholds("r.jtl:500");
        let (verdict, _) = run(&config, &[report("r.jtl", 0.0, 500.0)]);
        assert_eq!(verdict, Verdict::Unstable);

        let (verdict, _) = run(&config, &[report("r.jtl", 0.0, 499.0)]);
        assert_eq!(verdict, Verdict::Success);
    }

    #[test]
    fn test_response_time_threshold_matches_source_name_only() {
        let config = ThresholdConfig::new().with_response_time_thresholds("other.jtl:1");
        let (verdict, _) = run(&config, &[report("r.jtl", 0.0, 5000.0)]);
        assert_eq!(verdict, Verdict::Success);
    }

    #[test]
    fn test_non_numeric_threshold_fails_with_diagnostic() {
        let config = ThresholdConfig::new().with_response_time_thresholds("r.jtl:fast");
        let (verdict, outcome) = run(&config, &[report("r.jtl", 0.0, 1.0)]);
        assert_eq!(verdict, Verdict::Failure);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(matches!(
            outcome.diagnostics[0],
            EvalError::NonNumericThreshold { ref value, .. } if value == "fast"
        ));
    }

    #[test]
    fn test_padded_threshold_is_not_a_number() {
        let config = ThresholdConfig::new().with_response_time_thresholds("r.jtl: 500");
        let (verdict, outcome) = run(&config, &[report("r.jtl", 0.0, 1.0)]);
        assert_eq!(verdict, Verdict::Failure);
        assert!(matches!(
            outcome.diagnostics[0],
            EvalError::NonNumericThreshold { ref value, .. } if value == " 500"
        ));
    }

    #[test]
    fn test_later_report_cannot_lower_verdict() {
        let config = ThresholdConfig::new().with_error_failed_percent(20);
        let (verdict, _) = run(
            &config,
            &[report("bad.jtl", 90.0, 10.0), report("good.jtl", 0.0, 10.0)],
        );
        assert_eq!(verdict, Verdict::Failure);
    }

    #[test]
    fn test_per_test_case_names_offending_label() {
        let config = ThresholdConfig::new()
            .with_error_failed_percent(20)
            .with_error_unstable_percent(5)
            .with_per_test_case(true);
        let r = Report::new(
            "r.jtl",
            vec![
                LabelStats::new("A", 100.0, 100.0, 100.0, 0.0),
                LabelStats::new("B", 300.0, 300.0, 300.0, 10.0),
            ],
        )
        .unwrap();

        let (verdict, outcome) = run(&config, &[r]);
        assert_eq!(verdict, Verdict::Unstable);
        assert!(outcome
            .log
            .iter()
            .any(|l| l.contains("Label B") && l.contains("[UNSTABLE]")));
        assert!(!outcome.log.iter().any(|l| l.contains("Label A")));
    }
}
