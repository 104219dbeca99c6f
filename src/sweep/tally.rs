//! Per-row outcomes and the run tally.

use serde::Serialize;

/// How one row of a job resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deleted,
    /// The trigger or confirmation failed; the run went on.
    Failed(String),
    /// The row was gone from the document before its turn.
    Skipped,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Deleted => "deleted",
            Outcome::Failed(_) => "error",
            Outcome::Skipped => "skipped",
        }
    }
}

/// Counters for one run. Only ever incremented; a new run starts a new tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub deleted: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Deleted => self.deleted += 1,
            Outcome::Failed(_) => self.errors += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.deleted + self.errors + self.skipped
    }
}

impl std::fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "deleted {}, errors {}, skipped {}",
            self.deleted, self.errors, self.skipped
        )
    }
}
