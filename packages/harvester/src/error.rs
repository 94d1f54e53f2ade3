//! Typed errors for the pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Run-ending
//! failures surface as [`HarvestError`]; per-record failures inside the
//! detail fetcher are [`FetchError`] and are absorbed and counted rather
//! than propagated.

use thiserror::Error;

/// Errors that end a pipeline run (or its construction).
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Browser launch or session management failed.
    #[error("browser error: {0}")]
    Browser(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A listing page failed to load. Aborts the extraction run;
    /// pages persisted before the failure are kept.
    #[error("listing navigation failed for {url}: {source}")]
    ListingNavigation {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Provider selection or a provider call failed.
    #[error("provider error: {0}")]
    Provider(#[from] ai_providers::ProviderError),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// The run was cancelled.
    #[error("run cancelled")]
    Cancelled,
}

/// Per-record failures during detail fetching.
///
/// These never block or cancel sibling tasks; the fetcher logs them,
/// counts them, and moves on. The record stays in the backlog for the
/// next run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Could not open a page in the session pool.
    #[error("failed to open page: {0}")]
    Session(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Navigation to the detail page failed.
    #[error("navigation failed for {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Navigation exceeded the configured timeout.
    #[error("navigation timed out for {url}")]
    Timeout { url: String },

    /// Reading page content failed.
    #[error("failed to read content for {url}: {source}")]
    Content {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Writing the fetched details back failed.
    #[error("failed to persist details for {url}: {source}")]
    Persist {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, HarvestError>;
