//! Metrics collection for lifecycle operations

use crate::report::{PassReport, Phase};
use std::collections::BTreeMap;

/// Counters accumulated across passes, keyed by kind
#[derive(Debug, Clone, Default)]
pub struct LifecycleMetrics {
    /// New candidate records per kind
    pub recorded: BTreeMap<String, usize>,

    /// Duplicate detections per kind
    pub duplicates: BTreeMap<String, usize>,

    /// Retracted records per kind
    pub cleared: BTreeMap<String, usize>,

    /// Deleted resources per kind (including ones already gone)
    pub deleted: BTreeMap<String, usize>,

    /// Dry-run skips per kind
    pub dry_run: BTreeMap<String, usize>,

    /// Rate-limit signals per kind
    pub throttled: BTreeMap<String, usize>,

    /// Logged failures per kind, including aborted passes
    pub failures: BTreeMap<String, usize>,

    /// Mark passes completed
    pub mark_count: usize,

    /// Sweep passes completed
    pub sweep_count: usize,

    /// Total runtime in seconds
    pub total_runtime_secs: u64,
}

fn bump(map: &mut BTreeMap<String, usize>, kind: &str, count: usize) {
    if count > 0 {
        *map.entry(kind.to_string()).or_insert(0) += count;
    }
}

impl LifecycleMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished pass into the counters
    pub fn record_pass(&mut self, report: &PassReport) {
        let kind = report.kind.as_str();
        bump(&mut self.recorded, kind, report.recorded);
        bump(&mut self.duplicates, kind, report.duplicates);
        bump(&mut self.cleared, kind, report.cleared);
        bump(&mut self.deleted, kind, report.deleted + report.vanished);
        bump(&mut self.dry_run, kind, report.dry_run);
        bump(&mut self.throttled, kind, report.throttled);
        bump(&mut self.failures, kind, report.failures);
    }

    /// Count a pass that aborted
    pub fn record_abort(&mut self, kind: &str) {
        bump(&mut self.failures, kind, 1);
    }

    /// Count a completed phase run
    pub fn record_cycle(&mut self, phase: Phase) {
        match phase {
            Phase::Mark => self.mark_count += 1,
            Phase::Sweep => self.sweep_count += 1,
        }
    }

    /// Total new records across kinds
    pub fn total_recorded(&self) -> usize {
        self.recorded.values().sum()
    }

    /// Total deletions across kinds
    pub fn total_deleted(&self) -> usize {
        self.deleted.values().sum()
    }

    /// Total failures across kinds
    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Lifecycle Metrics Summary".to_string(),
            "=========================".to_string(),
            format!("Mark passes: {}", self.mark_count),
            format!("Sweep passes: {}", self.sweep_count),
            format!("Total runtime: {}s", self.total_runtime_secs),
        ];

        let sections = [
            ("Recorded", &self.recorded),
            ("Duplicates", &self.duplicates),
            ("Cleared", &self.cleared),
            ("Deleted", &self.deleted),
            ("Dry run", &self.dry_run),
            ("Throttled", &self.throttled),
            ("Failures", &self.failures),
        ];
        for (title, counts) in sections {
            if counts.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(format!("{} by kind:", title));
            for (kind, count) in counts {
                lines.push(format!("  {}: {}", kind, count));
            }
        }

        lines.join("\n")
    }
}
