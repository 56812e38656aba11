//! Orchestrator output types

use tally_domain::{MatchCandidate, ParsedLine, StrategyKind};

/// How one strategy fared for one line
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    /// Strategy family
    pub kind: StrategyKind,
    /// Candidates returned before merging and filtering
    pub hits: usize,
    /// Failure message if the strategy errored
    pub error: Option<String>,
}

impl StrategyReport {
    /// Whether the strategy failed
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Merged, filtered and ranked candidates for one search text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Qualifying candidates, highest confidence first, unique ids
    pub candidates: Vec<MatchCandidate>,
    /// Per-strategy diagnostics, in dispatch order
    pub reports: Vec<StrategyReport>,
}

impl MatchOutcome {
    /// Rank-1 candidate
    pub fn best(&self) -> Option<&MatchCandidate> {
        self.candidates.first()
    }

    /// The first `n` candidates
    pub fn top(&self, n: usize) -> &[MatchCandidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }

    /// Whether any candidate qualified
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// A classified line with its match outcome
#[derive(Debug, Clone, PartialEq)]
pub struct LineMatch {
    /// The classified line
    pub line: ParsedLine,
    /// Match outcome; empty for lines without search text
    pub outcome: MatchOutcome,
}
