//! CLI argument parsing for perfgate

use crate::threshold::{EvaluationMode, Verdict};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the evaluation outcome
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable build log (default)
    Text,
    /// JSON document for machine parsing
    Json,
}

/// Evaluation mode override
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Absolute,
    Relative,
}

impl From<ModeArg> for EvaluationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Absolute => EvaluationMode::Absolute,
            ModeArg::Relative => EvaluationMode::Relative,
        }
    }
}

/// Verdict the build already carries from earlier pipeline steps
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorVerdict {
    Success,
    Unstable,
    Failure,
}

impl From<PriorVerdict> for Verdict {
    fn from(prior: PriorVerdict) -> Self {
        match prior {
            PriorVerdict::Success => Verdict::Success,
            PriorVerdict::Unstable => Verdict::Unstable,
            PriorVerdict::Failure => Verdict::Failure,
        }
    }
}

/// One `--report NAME=FILE[,FILE...]` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSpec {
    pub name: String,
    /// Empty when the source produced no files
    pub files: Vec<PathBuf>,
}

/// Parse `NAME=FILE[,FILE...]`; `NAME=` declares a source with no files
pub fn parse_report_spec(s: &str) -> Result<ReportSpec, String> {
    let (name, files) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=FILE[,FILE...], got '{}'", s))?;
    if name.trim().is_empty() {
        return Err(format!("report source name is empty in '{}'", s));
    }

    let files = files
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(PathBuf::from)
        .collect();

    Ok(ReportSpec {
        name: name.trim().to_string(),
        files,
    })
}

#[derive(Parser, Debug)]
#[command(name = "perfgate")]
#[command(version)]
#[command(
    about = "Turn performance test reports into a pass/unstable/fail build verdict",
    long_about = None
)]
pub struct Cli {
    /// Gate file with thresholds (perfgate.toml); all thresholds off when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report source and its parsed report files (repeatable)
    #[arg(
        short,
        long = "report",
        value_name = "NAME=FILE[,FILE...]",
        value_parser = parse_report_spec,
        required = true
    )]
    pub reports: Vec<ReportSpec>,

    /// Override the mode from the gate file
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Build history directory (<DIR>/<build-number>/*.json)
    #[arg(long, value_name = "DIR")]
    pub history: Option<PathBuf>,

    /// Number of the build being evaluated (default: latest in history + 1)
    #[arg(short, long, value_name = "N")]
    pub build: Option<u32>,

    /// Verdict the build already has from earlier steps
    #[arg(long, value_enum, default_value = "success")]
    pub prior_verdict: PriorVerdict,

    /// Store the current reports in the history directory after evaluating
    #[arg(long, requires = "history")]
    pub record: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing to stderr
    #[arg(long)]
    pub debug: bool,
}
