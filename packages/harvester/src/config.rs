//! Environment-driven pipeline configuration.
//!
//! Every knob has a default so a bare environment still yields a working
//! config; `.env` files are honored via `dotenvy`.

use std::time::Duration;

use crate::error::{HarvestError, Result};

/// Randomized pre-navigation delay range, in milliseconds.
///
/// A deliberate anti-detection measure: each detail-page visit sleeps a
/// random duration from this range before navigating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for JitterRange {
    fn default() -> Self {
        Self {
            min_ms: 1_000,
            max_ms: 3_000,
        }
    }
}

/// Operational knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum listing pages to walk per extraction run.
    pub max_pages: u32,
    /// Detail-fetcher worker-pool size (concurrent browser sessions).
    pub fetch_concurrency: usize,
    /// Enrichment batch size (clamped to the provider's maximum).
    pub batch_size: usize,
    /// Cap on records enriched per run; `None` drains the whole backlog.
    pub enrich_limit: Option<usize>,
    /// Headless/headful browser toggle.
    pub headless: bool,
    /// Pre-navigation jitter range.
    pub jitter: JitterRange,
    /// Navigation timeout for listing and detail pages.
    pub navigation_timeout: Duration,
    /// Non-fatal wait for a content-bearing selector on detail pages.
    pub content_timeout: Duration,
    /// Wait for listing markup; timing out is end-of-results, not an error.
    pub listing_timeout: Duration,
    /// Pause between enrichment batches, on top of the provider rate gate.
    pub inter_batch_pause: Duration,
    /// Primary AI provider name.
    pub primary_provider: String,
    /// Fallback AI provider name.
    pub fallback_provider: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            fetch_concurrency: 3,
            batch_size: 5,
            enrich_limit: Some(100),
            headless: true,
            jitter: JitterRange::default(),
            navigation_timeout: Duration::from_secs(30),
            content_timeout: Duration::from_secs(10),
            listing_timeout: Duration::from_secs(30),
            inter_batch_pause: Duration::from_secs(10),
            primary_provider: "gemini".to_string(),
            fallback_provider: "openai".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            max_pages: env_parse("HARVEST_MAX_PAGES", defaults.max_pages)?,
            fetch_concurrency: env_parse("HARVEST_CONCURRENCY", defaults.fetch_concurrency)?,
            batch_size: env_parse("HARVEST_BATCH_SIZE", defaults.batch_size)?,
            enrich_limit: match env_parse::<usize>("HARVEST_ENRICH_LIMIT", 100)? {
                0 => None,
                n => Some(n),
            },
            headless: env_parse("HARVEST_HEADLESS", defaults.headless)?,
            jitter: JitterRange {
                min_ms: env_parse("HARVEST_JITTER_MIN_MS", defaults.jitter.min_ms)?,
                max_ms: env_parse("HARVEST_JITTER_MAX_MS", defaults.jitter.max_ms)?,
            },
            navigation_timeout: Duration::from_secs(env_parse("HARVEST_NAV_TIMEOUT_SECS", 30)?),
            content_timeout: Duration::from_secs(env_parse("HARVEST_CONTENT_TIMEOUT_SECS", 10)?),
            listing_timeout: Duration::from_secs(env_parse("HARVEST_LISTING_TIMEOUT_SECS", 30)?),
            inter_batch_pause: Duration::from_secs(env_parse("HARVEST_BATCH_PAUSE_SECS", 10)?),
            primary_provider: std::env::var("AI_PRIMARY_PROVIDER")
                .unwrap_or(defaults.primary_provider),
            fallback_provider: std::env::var("AI_FALLBACK_PROVIDER")
                .unwrap_or(defaults.fallback_provider),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fetch_concurrency == 0 {
            return Err(HarvestError::Config(
                "HARVEST_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(HarvestError::Config(
                "HARVEST_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.jitter.min_ms > self.jitter.max_ms {
            return Err(HarvestError::Config(format!(
                "jitter range is inverted: {} > {}",
                self.jitter.min_ms, self.jitter.max_ms
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| HarvestError::Config(format!("invalid value for {key}: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = PipelineConfig {
            fetch_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_jitter_is_rejected() {
        let config = PipelineConfig {
            jitter: JitterRange {
                min_ms: 5_000,
                max_ms: 1_000,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
