//! Scraping targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scraping target, one-to-many with job postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Stable name used as the posting key prefix (e.g. "hh").
    pub name: String,
    pub base_url: String,
    pub enabled: bool,
    /// Advisory delay hint between page loads, in milliseconds.
    pub rate_limit_ms: Option<i64>,
    pub last_scraped_at: Option<DateTime<Utc>>,
}

impl SourceRecord {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            enabled: true,
            rate_limit_ms: None,
            last_scraped_at: None,
        }
    }
}
