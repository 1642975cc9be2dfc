//! One evaluation pass over a build
//!
//! The pass owns the build verdict for its duration. It walks the
//! configured report sources in order, applies the missing-input policy,
//! runs the evaluator for the configured mode and collects the build log.
//!
//! Recoverable problems such as an unreadable report file or a non-numeric
//! threshold never abort the pass. They are kept as diagnostics and the
//! verdict is left as the remaining data dictates.

use crate::archive::ReportArchive;
use crate::baseline::{select_baseline, BuildRef};
use crate::error::EvalError;
use crate::stats::Report;
use crate::threshold::{
    AbsoluteEvaluator, AbsoluteOutcome, BuildVerdict, EvaluationMode, RelativeEvaluator,
    RelativeOutcome, ThresholdConfig, Verdict,
};

/// Parsed reports of one configured source (one parser/glob) for the current build
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSource {
    /// Name used in the build log (e.g. "JMeter")
    pub name: String,
    /// Empty when no report files were found for this source
    pub reports: Vec<Report>,
}

impl ReportSource {
    pub fn new(name: impl Into<String>, reports: Vec<Report>) -> Self {
        Self {
            name: name.into(),
            reports,
        }
    }
}

/// Everything one pass produced
#[derive(Debug)]
pub struct EvaluationOutcome {
    pub build: BuildRef,
    pub mode: EvaluationMode,
    pub verdict: Verdict,
    /// Build-log lines in the order they were produced
    pub log: Vec<String>,
    pub diagnostics: Vec<EvalError>,
    /// Baseline build used in relative mode
    pub baseline: Option<BuildRef>,
    /// Comparison results in relative mode
    pub relative: Option<RelativeOutcome>,
}

impl EvaluationOutcome {
    /// Label that failed the build, else the one that made it unstable
    pub fn offending_label(&self) -> Option<&str> {
        self.relative.as_ref().and_then(|r| r.offending_label())
    }

    /// Build log followed by the verdict line
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        for line in &self.log {
            report.push_str(line);
            report.push('\n');
        }
        if !self.diagnostics.is_empty() {
            report.push_str(&format!("\nDiagnostics ({}):\n", self.diagnostics.len()));
            for diagnostic in &self.diagnostics {
                report.push_str(&format!("  - {}\n", diagnostic));
            }
        }
        report.push_str(&format!(
            "\nPerformance: build {} finished with verdict {}\n",
            self.build, self.verdict
        ));
        report
    }
}

/// Runs the configured mode for one build
pub struct EvaluationPass<'a> {
    config: &'a ThresholdConfig,
    prior: Verdict,
    load_errors: Vec<EvalError>,
}

struct PassState {
    verdict: BuildVerdict,
    log: Vec<String>,
    diagnostics: Vec<EvalError>,
}

impl<'a> EvaluationPass<'a> {
    pub fn new(config: &'a ThresholdConfig) -> Self {
        Self {
            config,
            prior: Verdict::Success,
            load_errors: Vec::new(),
        }
    }

    /// Verdict the build already carries from earlier steps
    pub fn with_prior_verdict(mut self, prior: Verdict) -> Self {
        self.prior = prior;
        self
    }

    /// Report files of the current build that could not be read
    ///
    /// They are listed in the log and diagnostics; the pass evaluates the
    /// reports that did load.
    pub fn with_load_errors(mut self, errors: Vec<EvalError>) -> Self {
        self.load_errors = errors;
        self
    }

    /// Evaluate `build` from its report sources
    ///
    /// The archive is only consulted in relative mode.
    pub fn run<A: ReportArchive + ?Sized>(
        mut self,
        build: BuildRef,
        sources: &[ReportSource],
        archive: &A,
    ) -> EvaluationOutcome {
        let load_errors = std::mem::take(&mut self.load_errors);
        let mut log = self.config.describe();
        for err in &load_errors {
            log.push(format!("Performance: skipped unreadable report: {}", err));
        }
        let mut state = PassState {
            verdict: BuildVerdict::starting_at(self.prior),
            log,
            diagnostics: load_errors,
        };
        let mut outcome = EvaluationOutcome {
            build,
            mode: self.config.mode(),
            verdict: self.prior,
            log: Vec::new(),
            diagnostics: Vec::new(),
            baseline: None,
            relative: None,
        };

        tracing::info!(
            "Evaluating build {} in {} mode ({} sources)",
            build,
            self.config.mode(),
            sources.len()
        );

        match self.config.mode() {
            EvaluationMode::Absolute => self.run_absolute(sources, &mut state),
            EvaluationMode::Relative => {
                if let Some(current) = self.collect_current(sources, &mut state) {
                    self.run_relative(build, &current, archive, &mut state, &mut outcome);
                }
            }
        }

        outcome.verdict = state.verdict.get();
        outcome.log = state.log;
        outcome.diagnostics = state.diagnostics;
        outcome
    }

    fn run_absolute(&self, sources: &[ReportSource], state: &mut PassState) {
        let evaluator = AbsoluteEvaluator::new(self.config);
        for source in sources {
            if !self.check_present(source, state) {
                return;
            }
            let AbsoluteOutcome { log, diagnostics } =
                evaluator.evaluate(&source.reports, &mut state.verdict);
            state.log.extend(log);
            state.diagnostics.extend(diagnostics);
        }
    }

    /// Flattened current reports, or `None` when a source was missing
    fn collect_current(&self, sources: &[ReportSource], state: &mut PassState) -> Option<Vec<Report>> {
        let mut current = Vec::new();
        for source in sources {
            if !self.check_present(source, state) {
                return None;
            }
            current.extend(source.reports.iter().cloned());
        }
        Some(current)
    }

    fn run_relative<A: ReportArchive + ?Sized>(
        &self,
        build: BuildRef,
        current: &[Report],
        archive: &A,
        state: &mut PassState,
        outcome: &mut EvaluationOutcome,
    ) {
        let mode = self.config.baseline_mode();
        if !mode.is_enabled() {
            state
                .log
                .push("Performance: baseline offset is 0, relative comparison disabled".to_string());
            return;
        }

        let Some(baseline) = select_baseline(archive, build, mode) else {
            tracing::info!("No baseline build ({}) for {}", mode, build);
            state.log.push(format!(
                "Performance: no baseline build found ({}), skipping relative comparison",
                mode
            ));
            return;
        };
        outcome.baseline = Some(baseline);

        let baseline_reports = match archive.load_reports(baseline) {
            Ok(loaded) => {
                for err in loaded.errors {
                    state.log.push(format!(
                        "Performance: skipped unreadable report of build {}: {}",
                        baseline, err
                    ));
                    state.diagnostics.push(err);
                }
                loaded.reports
            }
            Err(err) => {
                tracing::warn!("Could not load baseline build {}: {}", baseline, err);
                state.log.push(format!(
                    "Performance: could not load reports of build {}: {}",
                    baseline, err
                ));
                state.diagnostics.push(err);
                return;
            }
        };
        if baseline_reports.is_empty() {
            let err = EvalError::EmptyBaseline { build: baseline };
            state.log.push(format!("Performance: {}", err));
            state.diagnostics.push(err);
        }

        let metric = self.config.comparison_metric();
        state.log.push(format!(
            "Comparison build no. - {} and {} using {}",
            baseline.number,
            build.number,
            metric.description()
        ));

        let relative =
            RelativeEvaluator::new(self.config).evaluate(current, &baseline_reports, &mut state.verdict);
        if !relative.skipped {
            state.log.extend(relative.table(metric));
        }
        if let Some(summary) = relative.summary() {
            state.log.push(summary);
        }
        outcome.relative = Some(relative);
    }

    /// Missing-input policy: `false` stops the pass
    ///
    /// A build already worse than Unstable is left alone; otherwise it is
    /// failed and the miss is recorded.
    fn check_present(&self, source: &ReportSource, state: &mut PassState) -> bool {
        if !source.reports.is_empty() {
            return true;
        }
        if state.verdict.get().is_worse_than(Verdict::Unstable) {
            tracing::debug!("No {} reports, build already failed", source.name);
            return false;
        }

        let verdict = state.verdict.raise(Verdict::Failure);
        let err = EvalError::MissingReports {
            name: source.name.clone(),
        };
        tracing::warn!("{}", err);
        state.log.push(format!(
            "Performance: {}. Has the report been generated? Setting build to {}",
            err, verdict
        ));
        state.diagnostics.push(err);
        false
    }
}
