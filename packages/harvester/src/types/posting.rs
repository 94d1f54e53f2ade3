//! Job-posting entities and their per-phase field groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enrichment::Enrichment;

/// A salary range as advertised on the listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub currency: Option<String>,
}

impl SalaryRange {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// A phase-1 record: only the fields a search-result card yields.
///
/// Identity is `(source, external_id)`; the same card seen twice must
/// upsert into one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubPosting {
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub url: String,
    pub salary: Option<SalaryRange>,
    pub location: Option<String>,
    pub remote: bool,
}

/// Phase-2 fields read from a posting's detail page.
///
/// Written as one atomic group together with `details_fetched_at`.
/// A selector miss yields `None` (or an empty description), never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailFields {
    pub description: String,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub employment: Option<String>,
    pub schedule: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// The central entity: a job posting progressing through three phases.
///
/// Phase gates are the nullable timestamps: `details_fetched_at` admits a
/// record to enrichment, `ai_enriched_at` marks it done. The invariant
/// `ai_enriched_at.is_some() => details_fetched_at.is_some()` holds for
/// every record; records never move back to an earlier phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub source: String,
    pub external_id: String,

    // Phase 1
    pub title: String,
    pub company: String,
    pub url: String,
    pub salary: Option<SalaryRange>,
    pub location: Option<String>,
    pub remote: bool,

    // Phase 2
    pub details: Option<DetailFields>,

    // Phase 3
    pub enrichment: Option<Enrichment>,

    // Lifecycle
    pub collected_at: DateTime<Utc>,
    pub details_fetched_at: Option<DateTime<Utc>>,
    pub ai_enriched_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl JobPosting {
    /// Create a phase-1 posting from a stub.
    pub fn from_stub(stub: StubPosting) -> Self {
        let now = Utc::now();
        Self {
            source: stub.source,
            external_id: stub.external_id,
            title: stub.title,
            company: stub.company,
            url: stub.url,
            salary: stub.salary,
            location: stub.location,
            remote: stub.remote,
            details: None,
            enrichment: None,
            collected_at: now,
            details_fetched_at: None,
            ai_enriched_at: None,
            updated_at: now,
        }
    }

    /// Whether the record is eligible for the detail-fetch phase.
    pub fn awaiting_details(&self) -> bool {
        self.details_fetched_at.is_none()
    }

    /// Whether the record is eligible for the enrichment phase.
    pub fn awaiting_enrichment(&self) -> bool {
        self.details_fetched_at.is_some() && self.ai_enriched_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub() -> StubPosting {
        StubPosting {
            source: "hh".to_string(),
            external_id: "123".to_string(),
            title: "Rust Developer".to_string(),
            company: "Acme".to_string(),
            url: "https://example.com/vacancy/123".to_string(),
            salary: None,
            location: None,
            remote: false,
        }
    }

    #[test]
    fn new_posting_awaits_details_not_enrichment() {
        let posting = JobPosting::from_stub(stub());
        assert!(posting.awaiting_details());
        assert!(!posting.awaiting_enrichment());
    }

    #[test]
    fn detailed_posting_awaits_enrichment() {
        let mut posting = JobPosting::from_stub(stub());
        posting.details_fetched_at = Some(Utc::now());
        assert!(!posting.awaiting_details());
        assert!(posting.awaiting_enrichment());
    }
}
