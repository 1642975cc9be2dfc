use anyhow::{Context, Result};
use clap::Parser;
use perfgate::archive::{read_reports, DirectoryArchive, LoadedReports, MemoryArchive, ReportArchive};
use perfgate::baseline::BuildRef;
use perfgate::cli::{Cli, OutputFormat, ReportSpec};
use perfgate::engine::{EvaluationPass, ReportSource};
use perfgate::error::EvalError;
use perfgate::gate_file::GateFile;
use perfgate::json_output::JsonOutcome;
use perfgate::stats::Report;
use perfgate::threshold::ThresholdConfig;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load one source's files; unreadable files are returned as errors, not fatal
fn load_source(spec: &ReportSpec) -> (ReportSource, Vec<EvalError>) {
    let LoadedReports { reports, errors } = read_reports(&spec.files);
    (ReportSource::new(spec.name.clone(), reports), errors)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let mut config = match &args.config {
        Some(path) => GateFile::from_file(path)?.to_config(),
        None => ThresholdConfig::default(),
    };
    if let Some(mode) = args.mode {
        config = config.with_mode(mode.into());
    }

    let directory = args.history.as_ref().map(DirectoryArchive::new);
    let memory = MemoryArchive::new();
    let archive: &dyn ReportArchive = match &directory {
        Some(dir) => dir,
        None => &memory,
    };

    let build = match args.build {
        Some(number) => BuildRef::new(number),
        None => directory
            .as_ref()
            .and_then(DirectoryArchive::latest)
            .map(|latest| BuildRef::new(latest.number.saturating_add(1)))
            .unwrap_or(BuildRef::new(1)),
    };

    let mut sources = Vec::with_capacity(args.reports.len());
    let mut load_errors = Vec::new();
    for spec in &args.reports {
        let (source, errors) = load_source(spec);
        sources.push(source);
        load_errors.extend(errors);
    }

    let outcome = EvaluationPass::new(&config)
        .with_prior_verdict(args.prior_verdict.into())
        .with_load_errors(load_errors)
        .run(build, &sources, archive);

    match args.format {
        OutputFormat::Text => print!("{}", outcome.to_report_string()),
        OutputFormat::Json => println!("{}", JsonOutcome::from(&outcome).to_json()?),
    }

    if args.record {
        if let Some(dir) = &directory {
            let current: Vec<Report> = sources
                .iter()
                .flat_map(|source| source.reports.iter().cloned())
                .collect();
            let written = dir
                .store_reports(build, &current)
                .with_context(|| format!("Failed to record build {}", build))?;
            tracing::info!("Recorded {} reports for build {}", written.len(), build);
        }
    }

    let code = outcome.verdict.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
