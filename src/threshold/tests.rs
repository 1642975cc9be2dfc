// Scenario tests for the threshold evaluators
//
// Each test models one realistic build: a handful of labels, a config as a
// user would write it, and the verdict the pipeline should end with.

use super::*;
use crate::stats::{LabelStats, Report};

fn label(name: &str, average: f64, error_percent: f64) -> LabelStats {
    LabelStats::new(name, average, average, average, error_percent)
}

/// Scenario: one label starts erroring, the other stays clean
/// Expected: Unstable, with the erroring label named in the log
#[test]
fn test_erroring_label_makes_build_unstable() {
    let report = Report::new(
        "checkout.jtl",
        vec![label("A", 100.0, 0.0), label("B", 300.0, 10.0)],
    )
    .unwrap();
    let config = ThresholdConfig::new()
        .with_error_unstable_percent(5)
        .with_error_failed_percent(20)
        .with_per_test_case(true);

    let mut verdict = BuildVerdict::new();
    let outcome = AbsoluteEvaluator::new(&config).evaluate(&[report], &mut verdict);

    assert_eq!(verdict.get(), Verdict::Unstable);
    assert!(outcome.log.iter().any(|l| l.contains("Label B")));
}

/// Scenario: same build and thresholds, judged on the report aggregate
/// Expected: Success, since the 5% mean error does not exceed the 5% limit
#[test]
fn test_erroring_label_averaged_into_report_stays_success() {
    let report = Report::new(
        "checkout.jtl",
        vec![label("A", 100.0, 0.0), label("B", 300.0, 10.0)],
    )
    .unwrap();
    let config = ThresholdConfig::new()
        .with_error_unstable_percent(5)
        .with_error_failed_percent(20);

    let mut verdict = BuildVerdict::new();
    let outcome = AbsoluteEvaluator::new(&config).evaluate(&[report], &mut verdict);

    assert_eq!(verdict.get(), Verdict::Success);
    assert!(outcome.log.iter().any(|l| l
        == "Performance: File checkout.jtl reported 5% of errors [SUCCESS]. Build status is: SUCCESS"));
    assert!(!outcome.log.iter().any(|l| l.contains("Label B")));
}

/// Scenario: latency of the only label grows by half
/// Expected: Unstable (30% band crossed, 60% band not), label "A" blamed
#[test]
fn test_latency_growth_makes_build_unstable() {
    let baseline = Report::new("api.jtl", vec![label("A", 100.0, 0.0)]).unwrap();
    let current = Report::new("api.jtl", vec![label("A", 150.0, 0.0)]).unwrap();
    let config = ThresholdConfig::new()
        .with_mode(EvaluationMode::Relative)
        .with_relative_unstable_positive(30.0)
        .with_relative_failed_positive(60.0);

    let mut verdict = BuildVerdict::new();
    let outcome =
        RelativeEvaluator::new(&config).evaluate(&[current], &[baseline], &mut verdict);

    assert_eq!(verdict.get(), Verdict::Unstable);
    assert_eq!(outcome.comparisons[0].change, RelativeChange::Percent(50.0));
    assert_eq!(outcome.offending_label(), Some("A"));
}

/// Scenario: a build that already failed its absolute checks is then
/// compared against a baseline that shows no regression
/// Expected: the relative pass cannot lower the verdict
#[test]
fn test_relative_pass_cannot_clear_earlier_failure() {
    let report = Report::new("api.jtl", vec![label("A", 100.0, 50.0)]).unwrap();
    let config = ThresholdConfig::new()
        .with_error_failed_percent(10)
        .with_relative_failed_positive(10.0);

    let mut verdict = BuildVerdict::new();
    AbsoluteEvaluator::new(&config).evaluate(std::slice::from_ref(&report), &mut verdict);
    assert_eq!(verdict.get(), Verdict::Failure);

    RelativeEvaluator::new(&config).evaluate(
        std::slice::from_ref(&report),
        std::slice::from_ref(&report),
        &mut verdict,
    );
    assert_eq!(verdict.get(), Verdict::Failure);
}

/// Scenario: the application got faster
/// Expected: only the negative bands apply, a big speed-up can still be
/// flagged when the user asked for it
#[test]
fn test_large_speedup_flagged_by_negative_band() {
    let baseline = Report::new("api.jtl", vec![label("search", 1000.0, 0.0)]).unwrap();
    let current = Report::new("api.jtl", vec![label("search", 400.0, 0.0)]).unwrap();
    let config = ThresholdConfig::new()
        .with_relative_failed_positive(10.0)
        .with_relative_unstable_negative(50.0);

    let mut verdict = BuildVerdict::new();
    let outcome =
        RelativeEvaluator::new(&config).evaluate(&[current], &[baseline], &mut verdict);

    assert_eq!(outcome.comparisons[0].change, RelativeChange::Percent(-60.0));
    assert_eq!(verdict.get(), Verdict::Unstable);
}

/// Scenario: multi-report build where the reports disagree
/// Expected: the worst report decides, whatever its position
#[test]
fn test_worst_report_decides_regardless_of_order() {
    let clean = Report::new("a.jtl", vec![label("x", 10.0, 0.0)]).unwrap();
    let flaky = Report::new("b.jtl", vec![label("y", 10.0, 8.0)]).unwrap();
    let broken = Report::new("c.jtl", vec![label("z", 10.0, 40.0)]).unwrap();
    let config = ThresholdConfig::new()
        .with_error_unstable_percent(5)
        .with_error_failed_percent(20);

    let orders = [
        vec![clean.clone(), flaky.clone(), broken.clone()],
        vec![broken.clone(), flaky.clone(), clean.clone()],
        vec![flaky, broken, clean],
    ];
    for reports in orders {
        let mut verdict = BuildVerdict::new();
        AbsoluteEvaluator::new(&config).evaluate(&reports, &mut verdict);
        assert_eq!(verdict.get(), Verdict::Failure);
    }
}
