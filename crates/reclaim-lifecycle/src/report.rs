//! Per-pass outcome counters

use reclaim_domain::PassId;
use std::fmt;

/// Which half of the lifecycle a pass ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Classify and record
    Mark,
    /// Delete expired candidates
    Sweep,
}

impl Phase {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Mark => "mark",
            Phase::Sweep => "sweep",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one Mark or Sweep pass over one kind did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Kind processed
    pub kind: String,
    /// Phase run
    pub phase: Phase,
    /// Listing pages fetched (Mark)
    pub pages: usize,
    /// New candidate records (Mark)
    pub recorded: usize,
    /// Candidates already recorded byte-for-byte (Mark)
    pub duplicates: usize,
    /// Records retracted because the resource became compliant or ignored (Mark)
    pub cleared: usize,
    /// Candidates skipped because their lease is still running (Sweep)
    pub leased: usize,
    /// Resources deleted (Sweep)
    pub deleted: usize,
    /// Resources already gone at delete time (Sweep)
    pub vanished: usize,
    /// Deletions skipped because deletion is disabled (Sweep)
    pub dry_run: usize,
    /// Rate-limit signals received
    pub throttled: usize,
    /// Per-item failures that were logged and skipped
    pub failures: usize,
    /// Whether the pass stopped early on cancellation
    pub cancelled: bool,
}

impl PassReport {
    /// Empty report for a kind and phase
    pub fn new(kind: impl Into<String>, phase: Phase) -> Self {
        Self {
            kind: kind.into(),
            phase,
            pages: 0,
            recorded: 0,
            duplicates: 0,
            cleared: 0,
            leased: 0,
            deleted: 0,
            vanished: 0,
            dry_run: 0,
            throttled: 0,
            failures: 0,
            cancelled: false,
        }
    }
}

/// Outcome of running one phase over every configured kind
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Pass that produced this report
    pub pass_id: PassId,
    /// Phase run
    pub phase: Phase,
    /// Reports of kinds that completed
    pub passes: Vec<PassReport>,
    /// Kinds whose pass aborted, with the error message
    pub failed: Vec<(String, String)>,
}

impl CycleReport {
    pub(crate) fn new(pass_id: PassId, phase: Phase) -> Self {
        Self {
            pass_id,
            phase,
            passes: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Report for one kind, if it completed
    pub fn pass(&self, kind: &str) -> Option<&PassReport> {
        self.passes.iter().find(|p| p.kind == kind)
    }

    /// Whether every kind completed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
