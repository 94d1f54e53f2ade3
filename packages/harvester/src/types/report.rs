//! Run summaries and backlog statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of one pipeline phase run.
///
/// Runs always complete with a report rather than a hard stop; records
/// that failed simply reappear in the next run's backlog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }
}

/// Backlog counts per phase gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub total: usize,
    pub awaiting_details: usize,
    pub awaiting_enrichment: usize,
    pub enriched: usize,
}
