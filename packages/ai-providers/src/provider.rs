//! The `Provider` trait and backend selection.
//!
//! Every backend exposes the same contract: analyze a batch of N postings
//! and return exactly N structured results, in request order. Backends
//! differ only in their model identifier, advertised request ceiling, and
//! maximum batch size; callers must honor whichever backend was selected.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ProviderError, Result};
use crate::gemini::Gemini;
use crate::openai::OpenAi;

/// One posting's analysis input.
///
/// `index` is echoed back by the model so a batch response can be matched
/// to its originating posting even if the provider reorders the array.
#[derive(Debug, Clone)]
pub struct PostingInput {
    pub index: usize,
    pub description: String,
    pub skills: Vec<String>,
}

impl PostingInput {
    pub fn new(index: usize, description: impl Into<String>, skills: Vec<String>) -> Self {
        Self {
            index,
            description: description.into(),
            skills,
        }
    }
}

/// An interchangeable AI backend.
///
/// Implementations return raw JSON objects; schema validation is the
/// caller's concern so that all backends stay validation-agnostic.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable backend name used in configuration and error messages.
    fn name(&self) -> &'static str;

    /// Model identifier this backend will call.
    fn model(&self) -> &str;

    /// Advertised requests-per-minute ceiling.
    fn requests_per_minute(&self) -> u32;

    /// Largest batch this backend accepts in a single call.
    fn max_batch_size(&self) -> usize;

    /// Whether the backend has a usable credential.
    fn is_available(&self) -> bool;

    /// Analyze a single posting. Returns `None` when the model produced
    /// no usable object for it.
    async fn analyze_one(&self, posting: &PostingInput) -> Result<Option<Value>>;

    /// Analyze a batch of postings. The returned vector has exactly the
    /// same length and order as the input; anything else is an error.
    async fn analyze_batch(&self, postings: &[PostingInput]) -> Result<Vec<Value>>;
}

impl std::fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("model", &self.model())
            .finish()
    }
}

/// Resolve a provider by configured name, falling back once.
///
/// The primary is tried first; if its credential is missing the fallback
/// is tried; if neither is usable this fails fast naming both, so a run
/// never proceeds silently without a provider.
pub fn select_provider(
    primary: &str,
    fallback: &str,
) -> Result<Box<dyn Provider>> {
    let candidates = [primary, fallback];
    for name in candidates {
        let provider = build_provider(name)?;
        if provider.is_available() {
            info!(provider = provider.name(), model = provider.model(), "selected AI provider");
            return Ok(provider);
        }
        warn!(provider = name, "provider unavailable (missing credential)");
    }
    Err(ProviderError::NoneAvailable {
        primary: primary.to_string(),
        fallback: fallback.to_string(),
    })
}

fn build_provider(name: &str) -> Result<Box<dyn Provider>> {
    match name {
        "gemini" => Ok(Box::new(Gemini::from_env())),
        "openai" => Ok(Box::new(OpenAi::from_env())),
        other => Err(ProviderError::UnknownProvider {
            name: other.to_string(),
        }),
    }
}

/// Shared helper: strip a markdown code fence the model may wrap around
/// its JSON output, then parse.
pub(crate) fn parse_json_lenient(provider: &'static str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .or_else(|_| {
            let inner = raw
                .trim()
                .trim_start_matches("```json")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim();
            serde_json::from_str(inner)
        })
        .map_err(|e| ProviderError::MalformedResponse {
            provider,
            reason: e.to_string(),
        })
}

/// Shared helper: coerce a parsed response into exactly `expected` objects.
///
/// Accepts either a bare array or an object with a `results` array, which
/// models produce interchangeably.
pub(crate) fn into_batch_results(
    provider: &'static str,
    value: Value,
    expected: usize,
) -> Result<Vec<Value>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ProviderError::MalformedResponse {
                    provider,
                    reason: "expected a JSON array of results".to_string(),
                })
            }
        },
        _ => {
            return Err(ProviderError::MalformedResponse {
                provider,
                reason: "expected a JSON array of results".to_string(),
            })
        }
    };

    if items.len() != expected {
        return Err(ProviderError::BatchLengthMismatch {
            provider,
            expected,
            got: items.len(),
        });
    }
    Ok(items)
}
