//! Phase 1: search-result extraction.
//!
//! Walks paginated search pages strictly in sequence (page N+1 depends on
//! page N's "next" affordance), parses each card into a stub posting, and
//! flushes after every page so a caller can persist incrementally instead
//! of holding the whole result set in memory.

use std::future::Future;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{navigate, wait_for_any_selector, SessionPool};
use crate::error::{HarvestError, Result};
use crate::scrape::salary::parse_salary;
use crate::scrape::selectors::{any_matches, first_text};
use crate::types::StubPosting;

/// Selectors that indicate listing markup has materialized.
const LISTING_READY: [&str; 3] = [
    "[data-qa='vacancy-serp__vacancy']",
    ".vacancy-serp-item",
    ".serp-item",
];

/// Card container candidates, newest markup first.
const CARD: [&str; 3] = [
    "[data-qa='vacancy-serp__vacancy']",
    ".vacancy-serp-item",
    ".serp-item",
];

const COMPANY: [&str; 3] = [
    "[data-qa='vacancy-serp__vacancy-employer']",
    ".vacancy-serp-item__meta-info-company",
    ".company-name",
];

const SALARY: [&str; 2] = [
    "[data-qa='vacancy-serp__vacancy-compensation']",
    ".vacancy-serp-item__compensation",
];

const LOCATION: [&str; 2] = [
    "[data-qa='vacancy-serp__vacancy-address']",
    ".vacancy-serp-item__meta-info-address",
];

const NEXT_PAGE: [&str; 2] = ["[data-qa='pager-next']", "a.pager-next"];

/// Path marker of a posting-detail link; the external id follows it.
const DETAIL_PATH_MARKER: &str = "/vacancy/";

/// One extraction run's input.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    /// Source name the stubs are keyed under.
    pub source: String,
    /// Site base URL, e.g. `https://hh.ru`.
    pub base_url: String,
    /// Opaque search-query text (category/query generation is upstream).
    pub text: String,
    /// Remote-only filter; also determines each stub's remote flag.
    pub remote_only: bool,
    /// Page cap for this run.
    pub max_pages: u32,
}

impl ListingQuery {
    /// Search URL for a given 1-based page number.
    pub fn page_url(&self, page: u32) -> String {
        let mut url = format!(
            "{}/search/vacancy?text={}&page={}",
            self.base_url.trim_end_matches('/'),
            urlencode(&self.text),
            page - 1,
        );
        if self.remote_only {
            url.push_str("&schedule=remote");
        }
        url
    }
}

/// Browser-driven listing extractor.
pub struct ListingExtractor<'a> {
    pool: &'a SessionPool,
    navigation_timeout: Duration,
    listing_timeout: Duration,
}

impl<'a> ListingExtractor<'a> {
    pub fn new(
        pool: &'a SessionPool,
        navigation_timeout: Duration,
        listing_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            navigation_timeout,
            listing_timeout,
        }
    }

    /// Walk search pages, invoking `flush` with each page's stubs.
    ///
    /// Returns the total number of stubs flushed. A failed page
    /// navigation aborts the run with an error; everything flushed
    /// before it stays persisted. A listing-markup wait timeout is the
    /// natural end of results, not an error.
    pub async fn run<F, Fut>(&self, query: &ListingQuery, mut flush: F) -> Result<usize>
    where
        F: FnMut(Vec<StubPosting>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let page = self
            .pool
            .page()
            .await
            .map_err(|e| HarvestError::Browser(Box::new(e)))?;

        let mut total = 0usize;
        let mut page_no = 1u32;

        loop {
            let url = query.page_url(page_no);
            debug!(url = %url, page = page_no, "loading listing page");

            navigate(&page, &url, self.navigation_timeout)
                .await
                .map_err(|e| HarvestError::ListingNavigation {
                    url: url.clone(),
                    source: Box::new(e),
                })?;

            // All layout candidates share one deadline; the wait costs a
            // single listing_timeout even when no layout matches.
            if !wait_for_any_selector(&page, &LISTING_READY, self.listing_timeout).await {
                info!(page = page_no, "listing markup never appeared; treating as end of results");
                break;
            }

            let html = page
                .content()
                .await
                .map_err(|e| HarvestError::Browser(Box::new(e)))?;

            let stubs = parse_listing_page(&html, query);
            let has_next = has_next_page(&html);
            let count = stubs.len();

            info!(page = page_no, stubs = count, "parsed listing page");
            if count > 0 {
                flush(stubs).await?;
                total += count;
            }

            if !has_next {
                debug!(page = page_no, "no next-page affordance; stopping");
                break;
            }
            if page_no >= query.max_pages {
                debug!(page = page_no, "page cap reached; stopping");
                break;
            }
            page_no += 1;
        }

        page.close().await;
        Ok(total)
    }
}

/// Parse one search-results page into stub postings.
///
/// A card that cannot yield both a non-empty title and a detail href is
/// skipped and logged; it never aborts the page.
pub fn parse_listing_page(html: &str, query: &ListingQuery) -> Vec<StubPosting> {
    let document = Html::parse_document(html);
    let mut stubs = Vec::new();

    for card_selector in CARD {
        let Ok(selector) = Selector::parse(card_selector) else {
            continue;
        };
        let cards: Vec<ElementRef> = document.select(&selector).collect();
        if cards.is_empty() {
            continue;
        }

        for card in cards {
            match parse_card(card, query) {
                Some(stub) => stubs.push(stub),
                None => warn!("skipping unparsable listing card"),
            }
        }
        // First card selector that matched owns the page layout.
        break;
    }

    stubs
}

fn parse_card(card: ElementRef<'_>, query: &ListingQuery) -> Option<StubPosting> {
    let anchor_selector = Selector::parse("a[href]").ok()?;
    let anchor = card
        .select(&anchor_selector)
        .find(|a| {
            a.value()
                .attr("href")
                .map(|href| href.contains(DETAIL_PATH_MARKER))
                .unwrap_or(false)
        })?;

    let href = anchor.value().attr("href")?;
    let external_id = external_id_from_href(href)?;
    let title = crate::scrape::selectors::normalized_text(anchor);
    if title.is_empty() {
        return None;
    }

    let url = resolve_href(&query.base_url, href);
    let salary_text = first_text(card, &SALARY);

    Some(StubPosting {
        source: query.source.clone(),
        external_id,
        title,
        company: first_text(card, &COMPANY).unwrap_or_default(),
        url,
        salary: salary_text.as_deref().and_then(parse_salary),
        // The remote flag comes from the filter already applied upstream,
        // not re-derived per card.
        remote: query.remote_only,
        location: first_text(card, &LOCATION),
    })
}

/// Whether the page advertises a next-page affordance.
pub fn has_next_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    any_matches(document.root_element(), &NEXT_PAGE)
}

/// Derive the external id from a detail-page href.
pub fn external_id_from_href(href: &str) -> Option<String> {
    let start = href.find(DETAIL_PATH_MARKER)? + DETAIL_PATH_MARKER.len();
    let id: String = href[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    (!id.is_empty()).then_some(id)
}

fn resolve_href(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

fn urlencode(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' ' => "+".to_string(),
            c if c.is_ascii_alphanumeric() => c.to_string(),
            c => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{b:02X}"))
                    .collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{listing_page_html, ListingCardFixture};

    fn query() -> ListingQuery {
        ListingQuery {
            source: "hh".to_string(),
            base_url: "https://hh.example".to_string(),
            text: "rust developer".to_string(),
            remote_only: false,
            max_pages: 5,
        }
    }

    #[test]
    fn page_url_is_zero_based_with_filter() {
        let mut q = query();
        q.remote_only = true;
        let url = q.page_url(1);
        assert!(url.contains("page=0"));
        assert!(url.contains("schedule=remote"));
        assert!(url.contains("text=rust+developer"));
    }

    #[test]
    fn valid_cards_parse_and_malformed_cards_are_skipped() {
        let html = listing_page_html(
            &[
                ListingCardFixture::new("101", "Rust Developer").with_salary("от 150 000 ₽"),
                ListingCardFixture::new("102", "Backend Engineer").with_company("Acme"),
                ListingCardFixture::new("103", "Systems Programmer"),
                ListingCardFixture::malformed(),
            ],
            false,
        );

        let stubs = parse_listing_page(&html, &query());
        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[0].external_id, "101");
        assert_eq!(stubs[0].salary.as_ref().unwrap().from, Some(150_000));
        assert_eq!(stubs[1].company, "Acme");
        assert!(stubs[2].url.contains("/vacancy/103"));
    }

    #[test]
    fn remote_flag_comes_from_the_filter() {
        let html = listing_page_html(&[ListingCardFixture::new("1", "Dev")], false);
        let mut q = query();
        q.remote_only = true;
        let stubs = parse_listing_page(&html, &q);
        assert!(stubs[0].remote);
    }

    #[test]
    fn next_page_detection() {
        let with_next = listing_page_html(&[ListingCardFixture::new("1", "Dev")], true);
        let without = listing_page_html(&[ListingCardFixture::new("1", "Dev")], false);
        assert!(has_next_page(&with_next));
        assert!(!has_next_page(&without));
    }

    #[test]
    fn external_id_extraction() {
        assert_eq!(
            external_id_from_href("/vacancy/12345?from=serp").as_deref(),
            Some("12345")
        );
        assert_eq!(
            external_id_from_href("https://hh.example/vacancy/987").as_deref(),
            Some("987")
        );
        assert_eq!(external_id_from_href("/company/42"), None);
    }
}
