//! Storage trait for job postings and sources.
//!
//! The store is the only shared mutable resource across phases. Phases
//! are decoupled through its phase-gate timestamps: any phase can be
//! re-run independently and picks up exactly the unfinished backlog.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    DetailFields, Enrichment, JobPosting, PipelineStats, SourceRecord, StubPosting,
};

/// Result of an upsert: whether a new row was created.
///
/// Reported explicitly by the store layer rather than inferred from
/// timestamp proximity, so it stays correct under concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub was_inserted: bool,
}

/// Durable store of job postings keyed by `(source, external_id)`.
///
/// Writes are per-record upserts; each field group (stub, details,
/// enrichment) lands as a single atomic update. Implementations must
/// uphold the phase-ordering invariant: enrichment is only applied to
/// records whose details are already fetched.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a phase-1 stub or refresh the listing fields of an
    /// existing row. Never creates a duplicate for the same key and
    /// never clears later-phase fields.
    async fn upsert_stub(&self, stub: &StubPosting) -> Result<UpsertOutcome>;

    /// Write the phase-2 field group and set `details_fetched_at`.
    async fn apply_details(
        &self,
        source: &str,
        external_id: &str,
        details: &DetailFields,
    ) -> Result<()>;

    /// Write the phase-3 field group and set `ai_enriched_at`.
    ///
    /// Fails if the record is missing or not yet detail-complete.
    async fn apply_enrichment(
        &self,
        source: &str,
        external_id: &str,
        enrichment: &Enrichment,
    ) -> Result<()>;

    /// Records with `details_fetched_at IS NULL`, oldest first.
    async fn detail_backlog(&self, limit: Option<usize>) -> Result<Vec<JobPosting>>;

    /// Records with `details_fetched_at IS NOT NULL AND ai_enriched_at
    /// IS NULL`, oldest first.
    async fn enrichment_backlog(&self, limit: Option<usize>) -> Result<Vec<JobPosting>>;

    /// Fetch one record by key.
    async fn get(&self, source: &str, external_id: &str) -> Result<Option<JobPosting>>;

    /// Backlog counts per phase.
    async fn stats(&self) -> Result<PipelineStats>;

    /// Register a source or refresh its metadata.
    async fn upsert_source(&self, source: &SourceRecord) -> Result<()>;

    /// Bump a source's `last_scraped_at` after a successful extraction run.
    async fn touch_source(&self, name: &str) -> Result<()>;
}
