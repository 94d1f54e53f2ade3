//! Phase 3: batched AI enrichment.
//!
//! The backlog is processed in batches. Each batch is one provider call,
//! gated by a rate limiter sized from the provider's advertised ceiling,
//! with a fixed pause between batches. Results are matched positionally
//! via the echoed index; a record whose result is missing or invalid is
//! dropped from the batch and stays in the backlog, while the rest of
//! the batch still lands.

pub mod schema;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use ai_providers::{PostingInput, Provider};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::traits::JobStore;
use crate::types::{JobPosting, RunReport};

use schema::{result_index, validate_enrichment};

pub use schema::SchemaViolation;

/// Batch driver for the enrichment phase.
pub struct EnrichmentEngine {
    store: Arc<dyn JobStore>,
    provider: Box<dyn Provider>,
    config: PipelineConfig,
    limiter: DefaultDirectRateLimiter,
}

impl EnrichmentEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Box<dyn Provider>,
        config: PipelineConfig,
    ) -> Self {
        let per_minute =
            NonZeroU32::new(provider.requests_per_minute()).unwrap_or(nonzero!(1u32));
        let limiter = RateLimiter::direct(Quota::per_minute(per_minute));
        Self {
            store,
            provider,
            config,
            limiter,
        }
    }

    /// Batch size honoring both the configured value and the provider cap.
    fn batch_size(&self) -> usize {
        self.config
            .batch_size
            .min(self.provider.max_batch_size())
            .max(1)
    }

    /// Drain (up to the configured limit of) the enrichment backlog.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport> {
        let started = Instant::now();
        let backlog = self
            .store
            .enrichment_backlog(self.config.enrich_limit)
            .await?;
        let batch_size = self.batch_size();
        info!(
            backlog = backlog.len(),
            batch_size,
            provider = self.provider.name(),
            model = self.provider.model(),
            "starting enrichment"
        );

        let mut report = RunReport::default();
        let mut batches = backlog.chunks(batch_size).peekable();

        while let Some(batch) = batches.next() {
            if cancel.is_cancelled() {
                info!("enrichment cancelled; remaining records stay in backlog");
                break;
            }

            self.limiter.until_ready().await;
            self.enrich_batch(batch, &mut report).await;

            if batches.peek().is_some() {
                tokio::time::sleep(self.config.inter_batch_pause).await;
            }
        }

        report.elapsed = started.elapsed();
        info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            "enrichment finished"
        );
        Ok(report)
    }

    /// Run one provider call and apply its results record by record.
    ///
    /// Provider-level failure fails the whole batch; schema or index
    /// violations fail only the record they belong to.
    async fn enrich_batch(&self, batch: &[JobPosting], report: &mut RunReport) {
        let inputs: Vec<PostingInput> = batch
            .iter()
            .enumerate()
            .map(|(i, posting)| {
                let details = posting.details.clone().unwrap_or_default();
                PostingInput::new(i, details.description, details.skills)
            })
            .collect();

        let results = match self.provider.analyze_batch(&inputs).await {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    batch = batch.len(),
                    error = %e,
                    "provider call failed; batch stays in backlog"
                );
                for _ in batch {
                    report.record_failure();
                }
                return;
            }
        };

        let mut handled = vec![false; batch.len()];
        for value in &results {
            let index = match result_index(value) {
                Ok(index) if index < batch.len() && !handled[index] => index,
                Ok(index) => {
                    warn!(index, "result index out of range or duplicated; dropped");
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "result carries no usable index; dropped");
                    continue;
                }
            };
            handled[index] = true;
            let posting = &batch[index];

            let outcome = match validate_enrichment(value) {
                Ok(enrichment) => self
                    .store
                    .apply_enrichment(&posting.source, &posting.external_id, &enrichment)
                    .await
                    .map_err(|e| e.to_string()),
                Err(violation) => Err(violation.to_string()),
            };

            match outcome {
                Ok(()) => report.record_success(),
                Err(reason) => {
                    warn!(
                        source = %posting.source,
                        external_id = %posting.external_id,
                        reason = %reason,
                        "record dropped from batch; stays in backlog"
                    );
                    report.record_failure();
                }
            }
        }

        for (index, was_handled) in handled.iter().enumerate() {
            if !was_handled {
                warn!(
                    source = %batch[index].source,
                    external_id = %batch[index].external_id,
                    "no result matched this record; stays in backlog"
                );
                report.record_failure();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{detailed_posting, MockProvider};
    use serde_json::json;

    fn enrichment_json(index: usize) -> serde_json::Value {
        json!({
            "index": index,
            "category": "development",
            "tags": ["backend"],
            "company_name": "Acme",
            "company_size": null,
            "company_industry": null,
            "company_type": null,
            "seniority": "middle",
            "tech_stack": [],
            "benefits": [],
            "work_format": "remote",
            "contract_type": "full_time",
            "salary_estimate": null,
            "summary": "A role."
        })
    }

    async fn seeded_store(count: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..count {
            detailed_posting(store.as_ref(), "hh", &format!("{i}")).await;
        }
        store
    }

    fn quick_config() -> PipelineConfig {
        PipelineConfig {
            batch_size: 2,
            inter_batch_pause: std::time::Duration::from_millis(0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn full_batch_lands_and_leaves_backlog_empty() {
        let store = seeded_store(2).await;
        let provider = MockProvider::new().with_batch(vec![enrichment_json(0), enrichment_json(1)]);
        let engine = EnrichmentEngine::new(store.clone(), Box::new(provider), quick_config());

        let report = engine.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert!(store.enrichment_backlog(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_record_is_dropped_but_batch_survives() {
        let store = seeded_store(2).await;
        let mut bad = enrichment_json(1);
        bad["seniority"] = json!("grand-wizard");
        let provider = MockProvider::new().with_batch(vec![enrichment_json(0), bad]);
        let engine = EnrichmentEngine::new(store.clone(), Box::new(provider), quick_config());

        let report = engine.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(store.enrichment_backlog(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reordered_results_land_on_the_right_records() {
        let store = seeded_store(2).await;
        // Results arrive in reverse array order; the echoed index governs.
        let provider = MockProvider::new().with_batch(vec![enrichment_json(1), enrichment_json(0)]);
        let engine = EnrichmentEngine::new(store.clone(), Box::new(provider), quick_config());

        let report = engine.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.succeeded, 2);
    }

    #[tokio::test]
    async fn provider_failure_fails_the_batch_not_the_run() {
        let store = seeded_store(2).await;
        let provider = MockProvider::new(); // no scripted batches: every call errors
        let engine = EnrichmentEngine::new(store.clone(), Box::new(provider), quick_config());

        let report = engine.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 2);
        assert_eq!(store.enrichment_backlog(None).await.unwrap().len(), 2);
    }
}
