//! In-memory storage implementation for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{HarvestError, Result};
use crate::traits::store::{JobStore, UpsertOutcome};
use crate::types::{
    DetailFields, Enrichment, JobPosting, PipelineStats, SourceRecord, StubPosting,
};

type Key = (String, String);

/// In-memory job store.
///
/// Useful for tests and development; data is lost on restart. Upholds the
/// same phase-ordering rules as the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    postings: RwLock<HashMap<Key, JobPosting>>,
    sources: RwLock<HashMap<String, SourceRecord>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored postings.
    pub fn len(&self) -> usize {
        self.postings.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a registered source by name.
    pub fn source(&self, name: &str) -> Option<SourceRecord> {
        self.sources.read().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn upsert_stub(&self, stub: &StubPosting) -> Result<UpsertOutcome> {
        let key = (stub.source.clone(), stub.external_id.clone());
        let mut postings = self.postings.write().unwrap();
        match postings.get_mut(&key) {
            Some(existing) => {
                existing.title = stub.title.clone();
                existing.company = stub.company.clone();
                existing.url = stub.url.clone();
                existing.salary = stub.salary.clone();
                existing.location = stub.location.clone();
                existing.remote = stub.remote;
                existing.updated_at = Utc::now();
                Ok(UpsertOutcome { was_inserted: false })
            }
            None => {
                postings.insert(key, JobPosting::from_stub(stub.clone()));
                Ok(UpsertOutcome { was_inserted: true })
            }
        }
    }

    async fn apply_details(
        &self,
        source: &str,
        external_id: &str,
        details: &DetailFields,
    ) -> Result<()> {
        let key = (source.to_string(), external_id.to_string());
        let mut postings = self.postings.write().unwrap();
        let posting = postings
            .get_mut(&key)
            .ok_or_else(|| storage_err(format!("no posting {source}/{external_id}")))?;
        posting.details = Some(details.clone());
        // Phase gates are set once; a refetch keeps the first timestamp.
        posting.details_fetched_at.get_or_insert_with(Utc::now);
        posting.updated_at = Utc::now();
        Ok(())
    }

    async fn apply_enrichment(
        &self,
        source: &str,
        external_id: &str,
        enrichment: &Enrichment,
    ) -> Result<()> {
        let key = (source.to_string(), external_id.to_string());
        let mut postings = self.postings.write().unwrap();
        let posting = postings
            .get_mut(&key)
            .ok_or_else(|| storage_err(format!("no posting {source}/{external_id}")))?;
        if posting.details_fetched_at.is_none() {
            return Err(storage_err(format!(
                "posting {source}/{external_id} is not detail-complete"
            )));
        }
        posting.enrichment = Some(enrichment.clone());
        posting.ai_enriched_at.get_or_insert_with(Utc::now);
        posting.updated_at = Utc::now();
        Ok(())
    }

    async fn detail_backlog(&self, limit: Option<usize>) -> Result<Vec<JobPosting>> {
        let postings = self.postings.read().unwrap();
        let mut backlog: Vec<JobPosting> = postings
            .values()
            .filter(|p| p.awaiting_details())
            .cloned()
            .collect();
        backlog.sort_by_key(|p| p.collected_at);
        backlog.truncate(limit.unwrap_or(usize::MAX));
        Ok(backlog)
    }

    async fn enrichment_backlog(&self, limit: Option<usize>) -> Result<Vec<JobPosting>> {
        let postings = self.postings.read().unwrap();
        let mut backlog: Vec<JobPosting> = postings
            .values()
            .filter(|p| p.awaiting_enrichment())
            .cloned()
            .collect();
        backlog.sort_by_key(|p| p.collected_at);
        backlog.truncate(limit.unwrap_or(usize::MAX));
        Ok(backlog)
    }

    async fn get(&self, source: &str, external_id: &str) -> Result<Option<JobPosting>> {
        let key = (source.to_string(), external_id.to_string());
        Ok(self.postings.read().unwrap().get(&key).cloned())
    }

    async fn stats(&self) -> Result<PipelineStats> {
        let postings = self.postings.read().unwrap();
        let mut stats = PipelineStats {
            total: postings.len(),
            ..Default::default()
        };
        for posting in postings.values() {
            if posting.awaiting_details() {
                stats.awaiting_details += 1;
            } else if posting.awaiting_enrichment() {
                stats.awaiting_enrichment += 1;
            } else {
                stats.enriched += 1;
            }
        }
        Ok(stats)
    }

    async fn upsert_source(&self, source: &SourceRecord) -> Result<()> {
        self.sources
            .write()
            .unwrap()
            .insert(source.name.clone(), source.clone());
        Ok(())
    }

    async fn touch_source(&self, name: &str) -> Result<()> {
        if let Some(source) = self.sources.write().unwrap().get_mut(name) {
            source.last_scraped_at = Some(Utc::now());
        }
        Ok(())
    }
}

fn storage_err(message: String) -> HarvestError {
    HarvestError::Storage(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(id: &str) -> StubPosting {
        StubPosting {
            source: "hh".to_string(),
            external_id: id.to_string(),
            title: "Rust Developer".to_string(),
            company: "Acme".to_string(),
            url: format!("https://example.com/vacancy/{id}"),
            salary: None,
            location: None,
            remote: false,
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_key() {
        let store = MemoryStore::new();
        let first = store.upsert_stub(&stub("1")).await.unwrap();
        let second = store.upsert_stub(&stub("1")).await.unwrap();
        assert!(first.was_inserted);
        assert!(!second.was_inserted);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn enrichment_requires_details() {
        let store = MemoryStore::new();
        store.upsert_stub(&stub("1")).await.unwrap();

        let enrichment: Enrichment = serde_json::from_value(serde_json::json!({
            "category": "development",
            "seniority": "middle",
            "work_format": "remote",
            "contract_type": "full_time",
            "company_name": null,
            "company_size": null,
            "company_industry": null,
            "company_type": null,
            "salary_estimate": null,
            "summary": null
        }))
        .unwrap();

        let err = store.apply_enrichment("hh", "1", &enrichment).await;
        assert!(err.is_err());

        store
            .apply_details("hh", "1", &DetailFields::default())
            .await
            .unwrap();
        store.apply_enrichment("hh", "1", &enrichment).await.unwrap();

        let posting = store.get("hh", "1").await.unwrap().unwrap();
        assert!(posting.details_fetched_at.is_some());
        assert!(posting.ai_enriched_at.is_some());
    }

    #[tokio::test]
    async fn backlogs_follow_phase_gates() {
        let store = MemoryStore::new();
        store.upsert_stub(&stub("1")).await.unwrap();
        store.upsert_stub(&stub("2")).await.unwrap();
        store
            .apply_details("hh", "1", &DetailFields::default())
            .await
            .unwrap();

        let details = store.detail_backlog(None).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].external_id, "2");

        let enrich = store.enrichment_backlog(None).await.unwrap();
        assert_eq!(enrich.len(), 1);
        assert_eq!(enrich[0].external_id, "1");
    }
}
