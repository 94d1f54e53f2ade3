//! Job-Posting Harvesting Pipeline
//!
//! A three-phase ETL pipeline for job postings:
//!
//! 1. **Extract** — walk a listing site's paginated search results in a
//!    headless browser and upsert stub postings.
//! 2. **Fetch** — visit each posting's detail page through a bounded
//!    worker pool and persist the long-form fields.
//! 3. **Enrich** — send detail-complete postings to an AI provider in
//!    batches and persist the validated structured analysis.
//!
//! Phases are decoupled through the store: each one selects its backlog
//! via the nullable phase-gate timestamps (`details_fetched_at`,
//! `ai_enriched_at`) and can be re-run independently. Interrupting a run
//! loses at most in-flight work; finished records never regress.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use harvester::{
//!     DetailFetcher, EnrichmentEngine, ListingExtractor, ListingQuery,
//!     MemoryStore, PipelineConfig, SessionPool,
//! };
//! use ai_providers::select_provider;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = PipelineConfig::from_env()?;
//! let store = Arc::new(MemoryStore::new());
//! let cancel = CancellationToken::new();
//!
//! // Phase 1: listing extraction
//! let pool = Arc::new(SessionPool::launch(config.headless).await?);
//! let extractor = ListingExtractor::new(&pool, config.navigation_timeout, config.listing_timeout);
//! let query = ListingQuery {
//!     source: "hh".into(),
//!     base_url: "https://hh.ru".into(),
//!     text: "rust developer".into(),
//!     remote_only: true,
//!     max_pages: config.max_pages,
//! };
//! extractor.run(&query, |stubs| async {
//!     for stub in &stubs {
//!         store.upsert_stub(stub).await?;
//!     }
//!     Ok(())
//! }).await?;
//! store.touch_source("hh").await?;
//!
//! // Phase 2: detail fetching
//! let fetcher = DetailFetcher::new(store.clone(), pool.clone(), config.clone());
//! fetcher.run(&cancel).await?;
//! pool.shutdown().await;
//!
//! // Phase 3: AI enrichment
//! let provider = select_provider(&config.primary_provider, &config.fallback_provider)?;
//! let engine = EnrichmentEngine::new(store.clone(), provider, config);
//! engine.run(&cancel).await?;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Domain types (postings, enrichment, reports)
//! - [`traits`] - The [`JobStore`] storage abstraction
//! - [`stores`] - Storage implementations (Postgres, in-memory)
//! - [`browser`] - Headless-browser session management
//! - [`scrape`] - Listing and detail-page parsing
//! - [`fetch`] - Bounded-concurrency detail fetching
//! - [`enrich`] - Batched AI enrichment and schema validation
//! - [`testing`] - Mock provider and HTML fixtures for tests

pub mod browser;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod scrape;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::{JitterRange, PipelineConfig};
pub use error::{FetchError, HarvestError, Result};
pub use traits::{JobStore, UpsertOutcome};
pub use types::{
    Category, ContractType, DetailFields, Enrichment, JobPosting, PipelineStats, RunReport,
    SalaryEstimate, SalaryRange, Seniority, SourceRecord, StubPosting, TechStackEntry, WorkFormat,
};

// Re-export the phase drivers
pub use browser::SessionPool;
pub use enrich::{EnrichmentEngine, SchemaViolation};
pub use fetch::{for_each_bounded, DetailFetcher};
pub use scrape::{parse_detail_page, parse_listing_page, parse_salary, ListingExtractor, ListingQuery};
pub use stores::{MemoryStore, PostgresStore};
