// src/report.rs
//! Batch report: what happened to each input row.

use crate::types::PageId;
use std::fmt;

/// The pipeline stage a row failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching or reading the source page
    Extract,
    /// Creating the destination record
    Create,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extract => write!(f, "extract"),
            Stage::Create => write!(f, "create"),
        }
    }
}

/// Final outcome of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Created { page_id: PageId },
    Skipped { reason: String },
    Failed { stage: Stage, cause: String },
}

/// One row of the batch report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// 1-based position in the input file
    pub row: usize,
    pub source_url: String,
    pub outcome: EntryOutcome,
    pub degraded_media: usize,
}

/// Batch counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub degraded_media: usize,
}

/// Result of running a batch, in row order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<ReportEntry>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to the report and updates the counters.
    pub fn with_entry(mut self, entry: ReportEntry) -> Self {
        match &entry.outcome {
            EntryOutcome::Created { .. } => self.stats.created += 1,
            EntryOutcome::Skipped { .. } => self.stats.skipped += 1,
            EntryOutcome::Failed { .. } => self.stats.failed += 1,
        }
        self.stats.degraded_media += entry.degraded_media;
        self.entries.push(entry);
        self
    }

    /// Checks that no row failed. Skipped rows are not failures.
    pub fn is_success(&self) -> bool {
        self.stats.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::Failed { .. }))
    }

    /// One-line summary for the end of a run.
    pub fn summary(&self) -> String {
        format!(
            "{} row(s): {} created, {} skipped, {} failed, {} image(s) left at their source",
            self.entries.len(),
            self.stats.created,
            self.stats.skipped,
            self.stats.failed,
            self.stats.degraded_media
        )
    }
}
