// Build verdict and the monotonic ratchet merge
//
// Every evaluator step produces a candidate verdict; the build verdict only
// ever moves up (Success -> Unstable -> Failure), never down.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Build outcome, ordered by severity
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    #[default]
    Success,
    Unstable,
    Failure,
}

impl Verdict {
    /// Ratchet merge: the more severe of the two
    ///
    /// # Example
    /// ```
    /// use perfgate::threshold::Verdict;
    ///
    /// assert_eq!(Verdict::Failure.merge(Verdict::Unstable), Verdict::Failure);
    /// assert_eq!(Verdict::Unstable.merge(Verdict::Success), Verdict::Unstable);
    /// ```
    pub fn merge(self, candidate: Verdict) -> Verdict {
        self.max(candidate)
    }

    /// `true` if `self` is strictly more severe than `other`
    pub fn is_worse_than(self, other: Verdict) -> bool {
        self > other
    }

    /// Process exit code used by the CLI
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Success => 0,
            Verdict::Failure => 1,
            Verdict::Unstable => 2,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Success => "SUCCESS",
            Verdict::Unstable => "UNSTABLE",
            Verdict::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

/// The single mutable verdict of one build
///
/// The only way to change it is [`BuildVerdict::raise`], which goes through
/// [`Verdict::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildVerdict {
    current: Verdict,
}

impl BuildVerdict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a verdict already carried by the build
    pub fn starting_at(verdict: Verdict) -> Self {
        Self { current: verdict }
    }

    /// Merge a candidate, returning the resulting verdict
    pub fn raise(&mut self, candidate: Verdict) -> Verdict {
        let merged = self.current.merge(candidate);
        if merged != self.current {
            tracing::debug!("Build verdict raised {} -> {}", self.current, merged);
        }
        self.current = merged;
        merged
    }

    pub fn get(&self) -> Verdict {
        self.current
    }
}
