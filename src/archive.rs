//! Stored reports of past builds
//!
//! Relative mode needs two things from the CI server: the predecessor chain
//! of the current build and the reports that were stored for a chosen
//! build. [`ReportArchive`] bundles both. [`DirectoryArchive`] is the
//! on-disk layout used by the CLI:
//!
//! ```text
//! history/
//! ├── 41/
//! │   └── api.json
//! ├── 42/
//! │   ├── api.json
//! │   └── checkout.json
//! └── 44/          # builds may be missing (deleted, aborted)
//!     └── api.json
//! ```
//!
//! Each `*.json` file holds one serialized [`Report`].

use crate::baseline::{BuildHistory, BuildRef};
use crate::error::{EvalError, Result};
use crate::stats::Report;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Build history that can also hand back a build's stored reports
pub trait ReportArchive: BuildHistory {
    /// Reports stored for `build`, in a stable order
    ///
    /// `Err` means the build itself could not be read. A single unreadable
    /// report is listed in [`LoadedReports::errors`] and the rest still load.
    fn load_reports(&self, build: BuildRef) -> Result<LoadedReports>;
}

/// Reports that loaded, plus the per-file errors of those that did not
#[derive(Debug, Default)]
pub struct LoadedReports {
    pub reports: Vec<Report>,
    pub errors: Vec<EvalError>,
}

impl LoadedReports {
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty() && self.errors.is_empty()
    }
}

impl From<Vec<Report>> for LoadedReports {
    fn from(reports: Vec<Report>) -> Self {
        Self {
            reports,
            errors: Vec::new(),
        }
    }
}

/// Filesystem archive: one numbered directory per build
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `build`'s reports
    pub fn build_dir(&self, build: BuildRef) -> PathBuf {
        self.root.join(build.number.to_string())
    }

    /// Numbers of all build directories, ascending
    ///
    /// An unreadable root yields an empty list; entries whose name is not a
    /// build number are ignored.
    pub fn builds(&self) -> Vec<BuildRef> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            tracing::debug!("No build history at {}", self.root.display());
            return Vec::new();
        };

        let mut builds: Vec<BuildRef> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .map(BuildRef::new)
            .collect();
        builds.sort();
        builds
    }

    /// The most recent recorded build
    pub fn latest(&self) -> Option<BuildRef> {
        self.builds().last().copied()
    }

    /// Store `reports` as `build`'s reports so later builds can use it as a baseline
    ///
    /// Files are prefixed with their position so loading returns them in
    /// the same order.
    pub fn store_reports(&self, build: BuildRef, reports: &[Report]) -> Result<Vec<PathBuf>> {
        let dir = self.build_dir(build);
        fs::create_dir_all(&dir).map_err(|source| EvalError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(reports.len());
        for (index, report) in reports.iter().enumerate() {
            let path = dir.join(format!("{:03}-{}.json", index, file_stem(report.source_name())));
            let json = serde_json::to_string_pretty(report).map_err(|source| {
                EvalError::MalformedReport {
                    path: path.clone(),
                    source,
                }
            })?;
            fs::write(&path, json).map_err(|source| EvalError::Io {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }
        tracing::debug!("Stored {} reports for build {}", written.len(), build);
        Ok(written)
    }
}

/// Report name reduced to characters safe in a file name
fn file_stem(source_name: &str) -> String {
    source_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl BuildHistory for DirectoryArchive {
    fn previous(&self, build: BuildRef) -> Option<BuildRef> {
        self.builds().into_iter().rev().find(|b| *b < build)
    }
}

impl ReportArchive for DirectoryArchive {
    fn load_reports(&self, build: BuildRef) -> Result<LoadedReports> {
        let dir = self.build_dir(build);
        let entries = fs::read_dir(&dir).map_err(|source| EvalError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        Ok(read_reports(&files))
    }
}

/// Read every file, keeping the reports that parse and the errors of those that don't
pub fn read_reports(paths: &[PathBuf]) -> LoadedReports {
    let mut loaded = LoadedReports::default();
    for path in paths {
        match read_report(path) {
            Ok(report) => loaded.reports.push(report),
            Err(err) => {
                tracing::warn!("Skipping report: {}", err);
                loaded.errors.push(err);
            }
        }
    }
    loaded
}

/// Read one serialized report
pub fn read_report(path: &Path) -> Result<Report> {
    let content = fs::read_to_string(path).map_err(|source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| EvalError::MalformedReport {
        path: path.to_path_buf(),
        source,
    })
}

/// In-memory archive, for embedding in other build tools and for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    builds: BTreeMap<BuildRef, Vec<Report>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a build and its reports
    pub fn insert(&mut self, build: BuildRef, reports: Vec<Report>) {
        self.builds.insert(build, reports);
    }

    pub fn with_build(mut self, build: BuildRef, reports: Vec<Report>) -> Self {
        self.insert(build, reports);
        self
    }
}

impl BuildHistory for MemoryArchive {
    fn previous(&self, build: BuildRef) -> Option<BuildRef> {
        self.builds.range(..build).next_back().map(|(b, _)| *b)
    }
}

impl ReportArchive for MemoryArchive {
    fn load_reports(&self, build: BuildRef) -> Result<LoadedReports> {
        Ok(self.builds.get(&build).cloned().unwrap_or_default().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::{select_baseline, BaselineMode};
    use crate::stats::LabelStats;
    use tempfile::TempDir;

    fn report(name: &str) -> Report {
        Report::new(name, vec![LabelStats::new("login", 100.0, 90.0, 150.0, 0.0)]).unwrap()
    }

    fn write_report(dir: &Path, file: &str, report: &Report) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(file), serde_json::to_string(report).unwrap()).unwrap();
    }

    #[test]
    fn test_directory_archive_skips_gaps() {
        let tmp = TempDir::new().unwrap();
        for n in [41, 42, 44] {
            write_report(&tmp.path().join(n.to_string()), "api.json", &report("api"));
        }
        fs::create_dir_all(tmp.path().join("lastSuccessful")).unwrap();

        let archive = DirectoryArchive::new(tmp.path());
        assert_eq!(
            archive.builds(),
            vec![BuildRef::new(41), BuildRef::new(42), BuildRef::new(44)]
        );
        assert_eq!(archive.latest(), Some(BuildRef::new(44)));
        assert_eq!(archive.previous(BuildRef::new(44)), Some(BuildRef::new(42)));
        assert_eq!(archive.previous(BuildRef::new(45)), Some(BuildRef::new(44)));
        assert_eq!(archive.previous(BuildRef::new(41)), None);

        let baseline = select_baseline(
            &archive,
            BuildRef::new(45),
            BaselineMode::NthPreviousBuild(3),
        );
        assert_eq!(baseline, Some(BuildRef::new(41)));
    }

    #[test]
    fn test_directory_archive_loads_reports_in_name_order() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("7");
        write_report(&dir, "b.json", &report("second"));
        write_report(&dir, "a.json", &report("first"));
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let loaded = DirectoryArchive::new(tmp.path())
            .load_reports(BuildRef::new(7))
            .unwrap();
        let names: Vec<_> = loaded.reports.iter().map(|r| r.source_name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(loaded.errors.is_empty());
    }

    #[test]
    fn test_directory_archive_missing_build_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = DirectoryArchive::new(tmp.path())
            .load_reports(BuildRef::new(3))
            .unwrap_err();
        assert!(matches!(err, EvalError::Io { .. }));
    }

    #[test]
    fn test_malformed_report_does_not_hide_the_others() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("1");
        write_report(&dir, "a.json", &report("first"));
        fs::write(dir.join("b.json"), "{ not json").unwrap();
        write_report(&dir, "c.json", &report("third"));

        let loaded = DirectoryArchive::new(tmp.path())
            .load_reports(BuildRef::new(1))
            .unwrap();
        let names: Vec<_> = loaded.reports.iter().map(|r| r.source_name()).collect();
        assert_eq!(names, vec!["first", "third"]);
        assert_eq!(loaded.errors.len(), 1);
        assert!(matches!(loaded.errors[0], EvalError::MalformedReport { ref path, .. } if path.ends_with("b.json")));
    }

    #[test]
    fn test_invalid_report_data_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("negative.json");
        fs::write(
            &path,
            r#"{"source_name":"r.jtl","labels":[{"label":"a","average":-1.0,"median":1.0,"percentile90":1.0,"error_percent":0.0}]}"#,
        )
        .unwrap();

        let loaded = read_reports(&[path, tmp.path().join("absent.json")]);
        assert!(loaded.reports.is_empty());
        assert!(matches!(loaded.errors[0], EvalError::MalformedReport { .. }));
        assert!(matches!(loaded.errors[1], EvalError::Io { .. }));
    }

    #[test]
    fn test_missing_root_has_no_builds() {
        let archive = DirectoryArchive::new("/definitely/not/here");
        assert!(archive.builds().is_empty());
        assert_eq!(archive.previous(BuildRef::new(10)), None);
    }

    #[test]
    fn test_store_then_load_roundtrip_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let archive = DirectoryArchive::new(tmp.path().join("history"));
        let reports = vec![report("zeta/results.jtl"), report("alpha.jtl")];

        let written = archive.store_reports(BuildRef::new(12), &reports).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("000-zeta_results_jtl.json"));

        let loaded = archive.load_reports(BuildRef::new(12)).unwrap();
        assert_eq!(loaded.reports, reports);
        assert_eq!(archive.latest(), Some(BuildRef::new(12)));
    }

    #[test]
    fn test_memory_archive() {
        let archive = MemoryArchive::new()
            .with_build(BuildRef::new(1), vec![report("one")])
            .with_build(BuildRef::new(3), vec![report("three")]);

        assert_eq!(archive.previous(BuildRef::new(3)), Some(BuildRef::new(1)));
        assert_eq!(archive.previous(BuildRef::new(1)), None);
        assert_eq!(
            archive.load_reports(BuildRef::new(3)).unwrap().reports[0].source_name(),
            "three"
        );
        assert!(archive.load_reports(BuildRef::new(2)).unwrap().is_empty());
    }
}
