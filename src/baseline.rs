//! Baseline build selection
//!
//! Relative thresholds compare the current build against an earlier one.
//! The earlier build is found by walking the predecessor chain of a
//! [`BuildHistory`]; running out of history is not an error, it simply
//! means there is nothing to compare against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a build in the pipeline's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildRef {
    /// Build number as assigned by the CI server
    pub number: u32,
}

impl BuildRef {
    pub fn new(number: u32) -> Self {
        Self { number }
    }
}

impl fmt::Display for BuildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.number)
    }
}

/// Read-only view of a build history
pub trait BuildHistory {
    /// The build that ran immediately before `build`, if any
    fn previous(&self, build: BuildRef) -> Option<BuildRef>;
}

/// Which earlier build acts as the baseline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMode {
    /// The immediately preceding build
    #[default]
    PreviousBuild,
    /// The build `n` steps back; `0` disables the comparison
    NthPreviousBuild(u32),
}

impl BaselineMode {
    /// Build an Nth-previous mode from raw user input, clamping into `[0, u32::MAX]`
    pub fn nth_from_raw(n: i64) -> Self {
        BaselineMode::NthPreviousBuild(n.clamp(0, i64::from(u32::MAX)) as u32)
    }

    /// `false` for `NthPreviousBuild(0)`, which means "no baseline"
    pub fn is_enabled(&self) -> bool {
        !matches!(self, BaselineMode::NthPreviousBuild(0))
    }

    fn steps(&self) -> u32 {
        match self {
            BaselineMode::PreviousBuild => 1,
            BaselineMode::NthPreviousBuild(n) => *n,
        }
    }
}

impl fmt::Display for BaselineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineMode::PreviousBuild => write!(f, "previous build"),
            BaselineMode::NthPreviousBuild(n) => write!(f, "{} builds back", n),
        }
    }
}

/// Select the baseline build for `current`
///
/// Returns `None` when the history is shorter than the requested offset,
/// and for `NthPreviousBuild(0)`.
///
/// # Example
/// ```
/// use perfgate::baseline::{select_baseline, BaselineMode, BuildHistory, BuildRef};
///
/// struct Linear;
/// impl BuildHistory for Linear {
///     fn previous(&self, build: BuildRef) -> Option<BuildRef> {
///         build.number.checked_sub(1).filter(|n| *n > 0).map(BuildRef::new)
///     }
/// }
///
/// let baseline = select_baseline(&Linear, BuildRef::new(3), BaselineMode::NthPreviousBuild(2));
/// assert_eq!(baseline, Some(BuildRef::new(1)));
/// ```
pub fn select_baseline<H: BuildHistory + ?Sized>(
    history: &H,
    current: BuildRef,
    mode: BaselineMode,
) -> Option<BuildRef> {
    if !mode.is_enabled() {
        return None;
    }

    let mut build = current;
    for _ in 0..mode.steps() {
        build = history.previous(build)?;
    }
    tracing::debug!("Selected baseline {} for build {} ({})", build, current, mode);
    Some(build)
}
