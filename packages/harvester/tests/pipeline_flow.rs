//! End-to-end pipeline flow over the in-memory store and mock provider.
//!
//! Exercises the store-decoupled phase contract without a browser:
//! listing HTML is parsed from fixtures, detail fields are applied
//! through the bounded scheduler, and enrichment runs against scripted
//! provider responses.

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use harvester::enrich::EnrichmentEngine;
use harvester::fetch::for_each_bounded;
use harvester::scrape::{parse_listing_page, ListingQuery};
use harvester::testing::{
    detail_page_html, listing_page_html, DetailPageFixture, ListingCardFixture, MockProvider,
};
use harvester::{DetailFields, JobStore, MemoryStore, PipelineConfig};

fn query() -> ListingQuery {
    ListingQuery {
        source: "hh".to_string(),
        base_url: "https://hh.example".to_string(),
        text: "rust developer".to_string(),
        remote_only: false,
        max_pages: 5,
    }
}

fn enrichment_json(index: usize) -> serde_json::Value {
    json!({
        "index": index,
        "category": "development",
        "tags": ["backend"],
        "company_name": "Acme",
        "company_size": null,
        "company_industry": null,
        "company_type": null,
        "seniority": "senior",
        "tech_stack": [
            {"name": "Rust", "category": "language", "required": true}
        ],
        "benefits": [],
        "work_format": "remote",
        "contract_type": "full_time",
        "salary_estimate": {
            "from": 250_000, "to": 350_000,
            "confidence": 0.8, "rationale": "senior rust backend"
        },
        "summary": "Backend role."
    })
}

fn config(batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        batch_size,
        inter_batch_pause: std::time::Duration::from_millis(0),
        ..Default::default()
    }
}

/// Three well-formed cards and one malformed card on one search page,
/// then a concurrency-2 detail pass, then one batch of enrichment:
/// all three records end fully enriched in a single provider call.
#[tokio::test]
async fn three_cards_flow_through_all_phases() {
    let store = Arc::new(MemoryStore::new());

    // Phase 1: parse and upsert.
    let html = listing_page_html(
        &[
            ListingCardFixture::new("101", "Rust Developer").with_salary("от 200 000 ₽"),
            ListingCardFixture::new("102", "Backend Engineer").with_company("Acme"),
            ListingCardFixture::new("103", "Systems Programmer"),
            ListingCardFixture::malformed(),
        ],
        false,
    );
    let stubs = parse_listing_page(&html, &query());
    assert_eq!(stubs.len(), 3);
    for stub in &stubs {
        store.upsert_stub(stub).await.unwrap();
    }

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.awaiting_details, 3);

    // Phase 2: apply details through the bounded scheduler.
    let backlog = store.detail_backlog(None).await.unwrap();
    let detail_html = detail_page_html(
        &DetailPageFixture::new("Build backend services in Rust.")
            .with_skills(&["Rust", "PostgreSQL"]),
    );
    let cancel = CancellationToken::new();
    let (succeeded, failed) = for_each_bounded(backlog, 2, &cancel, {
        let store = store.clone();
        let detail_html = detail_html.clone();
        move |posting| {
            let store = store.clone();
            let details = harvester::parse_detail_page(&detail_html);
            async move {
                store
                    .apply_details(&posting.source, &posting.external_id, &details)
                    .await
                    .is_ok()
            }
        }
    })
    .await;
    assert_eq!(succeeded, 3);
    assert_eq!(failed, 0);

    // Phase 3: one batch, one provider call, three enriched.
    let provider = MockProvider::new().with_batch(vec![
        enrichment_json(0),
        enrichment_json(1),
        enrichment_json(2),
    ]);
    let call_log = provider.call_log();
    let engine = EnrichmentEngine::new(store.clone(), Box::new(provider), config(5));
    let report = engine.run(&cancel).await.unwrap();

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(call_log.lock().unwrap().as_slice(), &[3]);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.enriched, 3);
    assert_eq!(stats.awaiting_details, 0);
    assert_eq!(stats.awaiting_enrichment, 0);

    let posting = store.get("hh", "101").await.unwrap().unwrap();
    assert!(posting.details_fetched_at.is_some());
    assert!(posting.ai_enriched_at.is_some());
    assert_eq!(
        posting.details.unwrap().skills,
        vec!["Rust".to_string(), "PostgreSQL".to_string()]
    );
}

/// Re-running a phase is a no-op once its backlog is drained, and
/// re-seen listing cards never duplicate rows or regress later phases.
#[tokio::test]
async fn reruns_converge_without_duplicates_or_rollback() {
    let store = Arc::new(MemoryStore::new());

    let html = listing_page_html(&[ListingCardFixture::new("7", "Rust Dev")], false);
    let stubs = parse_listing_page(&html, &query());
    store.upsert_stub(&stubs[0]).await.unwrap();
    store
        .apply_details("hh", "7", &DetailFields::default())
        .await
        .unwrap();

    let first_gate = store
        .get("hh", "7")
        .await
        .unwrap()
        .unwrap()
        .details_fetched_at
        .unwrap();

    // The same card seen on a later extraction run.
    let outcome = store.upsert_stub(&stubs[0]).await.unwrap();
    assert!(!outcome.was_inserted);

    let posting = store.get("hh", "7").await.unwrap().unwrap();
    assert_eq!(posting.details_fetched_at, Some(first_gate));
    assert!(store.detail_backlog(None).await.unwrap().is_empty());

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 1);
}

/// A batch where one result is schema-invalid and one record gets no
/// result at all: the valid records land, the rest stay in the backlog.
#[tokio::test]
async fn partial_batches_make_partial_progress() {
    let store = Arc::new(MemoryStore::new());
    for id in ["1", "2", "3"] {
        harvester::testing::detailed_posting(store.as_ref(), "hh", id).await;
    }

    let mut invalid = enrichment_json(1);
    invalid["work_format"] = json!("astral");
    let provider = MockProvider::new().with_batch(vec![
        enrichment_json(0),
        invalid,
        enrichment_json(2),
    ]);
    let engine = EnrichmentEngine::new(store.clone(), Box::new(provider), config(5));

    let report = engine.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let remaining = store.enrichment_backlog(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].external_id, "2");
}

/// The source registry records where postings come from and when the
/// site was last walked.
#[tokio::test]
async fn source_registry_tracks_last_scrape() {
    let store = MemoryStore::new();
    store
        .upsert_source(&harvester::SourceRecord {
            name: "hh".to_string(),
            base_url: "https://hh.example".to_string(),
            enabled: true,
            rate_limit_ms: Some(2_000),
            last_scraped_at: None,
        })
        .await
        .unwrap();

    assert!(store.source("hh").unwrap().last_scraped_at.is_none());
    store.touch_source("hh").await.unwrap();
    assert!(store.source("hh").unwrap().last_scraped_at.is_some());

    // Touching an unregistered source is a no-op, not an error.
    store.touch_source("unknown").await.unwrap();
}

/// The enrichment limit caps a run; the remainder is picked up by the
/// next run.
#[tokio::test]
async fn enrich_limit_bounds_a_run() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..4 {
        harvester::testing::detailed_posting(store.as_ref(), "hh", &i.to_string()).await;
    }

    let mut cfg = config(2);
    cfg.enrich_limit = Some(2);
    let provider = MockProvider::new().with_batch(vec![enrichment_json(0), enrichment_json(1)]);
    let engine = EnrichmentEngine::new(store.clone(), Box::new(provider), cfg);

    let report = engine.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(store.enrichment_backlog(None).await.unwrap().len(), 2);
}
