//! Listing-site scraping: search-page extraction and detail-page parsing.
//!
//! Parsing is kept in pure functions over already-fetched HTML so it can
//! be tested against fixtures without a browser; navigation lives in the
//! extractor/fetcher run loops.

pub mod detail;
pub mod listing;
pub mod salary;
pub mod selectors;

pub use detail::parse_detail_page;
pub use listing::{parse_listing_page, ListingExtractor, ListingQuery};
pub use salary::parse_salary;
