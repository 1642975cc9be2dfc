// Threshold evaluation and the build verdict
//
// Two evaluators share one verdict ratchet:
// - absolute: fixed error-rate and response-time ceilings per report
// - relative: percentage change of a label metric against a baseline build
//
// Both route every candidate through `BuildVerdict::raise`, so a verdict
// that has reached Unstable or Failure can never be lowered again within
// the same build.

mod absolute;
mod config;
mod relative;
mod verdict;

pub use absolute::{AbsoluteEvaluator, AbsoluteOutcome};
pub use config::{
    exceeds, parse_response_time_map, ComparisonMetric, EvaluationMode, ThresholdConfig,
    THRESHOLD_TOLERANCE,
};
pub use relative::{round2, LabelComparison, RelativeChange, RelativeEvaluator, RelativeOutcome};
pub use verdict::{BuildVerdict, Verdict};

#[cfg(test)]
mod tests;
