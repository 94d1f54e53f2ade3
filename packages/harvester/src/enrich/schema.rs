//! Validation of raw provider output against the enrichment schema.
//!
//! The provider returns one JSON object per posting. Deserializing into
//! [`Enrichment`] enforces the enum whitelists; the bounds checks here
//! guard against runaway free-text fields. A violation drops only the
//! offending record from its batch.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::types::Enrichment;

const MAX_SUMMARY_CHARS: usize = 2_000;
const MAX_RATIONALE_CHARS: usize = 1_000;
const MAX_TAGS: usize = 30;
const MAX_TECH_STACK: usize = 50;

/// Why a provider result was rejected.
#[derive(Debug, Error)]
pub enum SchemaViolation {
    #[error("result is not a JSON object")]
    NotAnObject,

    #[error("missing or non-numeric index field")]
    MissingIndex,

    #[error("schema mismatch: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("field {field} exceeds limit ({actual} > {limit})")]
    FieldTooLarge {
        field: &'static str,
        actual: usize,
        limit: usize,
    },
}

/// Read the positional `index` a result claims to answer for.
pub fn result_index(value: &Value) -> Result<usize, SchemaViolation> {
    let object = value.as_object().ok_or(SchemaViolation::NotAnObject)?;
    object
        .get("index")
        .and_then(Value::as_u64)
        .map(|i| i as usize)
        .ok_or(SchemaViolation::MissingIndex)
}

/// Validate one provider result and convert it into an [`Enrichment`].
pub fn validate_enrichment(value: &Value) -> Result<Enrichment, SchemaViolation> {
    if !value.is_object() {
        return Err(SchemaViolation::NotAnObject);
    }

    let enrichment: Enrichment = serde_json::from_value(value.clone())?;

    check_len(
        "summary",
        enrichment.summary.as_deref().map_or(0, |s| s.chars().count()),
        MAX_SUMMARY_CHARS,
    )?;
    if let Some(estimate) = &enrichment.salary_estimate {
        check_len(
            "salary_estimate.rationale",
            estimate.rationale.chars().count(),
            MAX_RATIONALE_CHARS,
        )?;
    }
    check_len("tags", enrichment.tags.len(), MAX_TAGS)?;
    check_len("tech_stack", enrichment.tech_stack.len(), MAX_TECH_STACK)?;

    debug!(category = ?enrichment.category, "provider result validated");
    Ok(enrichment)
}

fn check_len(field: &'static str, actual: usize, limit: usize) -> Result<(), SchemaViolation> {
    if actual > limit {
        return Err(SchemaViolation::FieldTooLarge {
            field,
            actual,
            limit,
        });
    }
    Ok(())
}
