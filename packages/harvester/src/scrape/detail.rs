//! Phase 2: detail-page parsing.
//!
//! Every field is optional-by-design: a selector miss produces an empty
//! or `None` value, and the record still counts as detail-complete. The
//! markup variants covered are the current data-qa attributes with the
//! older class names as fallbacks.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

use crate::scrape::selectors::{all_texts, first_text, first_text_block};
use crate::types::DetailFields;

/// Selector whose appearance means the description has rendered; the
/// fetcher waits on this before snapshotting the page.
pub const DESCRIPTION_READY: &str = "[data-qa='vacancy-description']";

const DESCRIPTION: [&str; 3] = [
    "[data-qa='vacancy-description']",
    ".vacancy-description",
    ".g-user-content",
];

const SKILLS: [&str; 3] = [
    "[data-qa='skills-element']",
    "[data-qa='bloko-tag__text']",
    ".bloko-tag__section_text",
];

const EXPERIENCE: [&str; 2] = [
    "[data-qa='vacancy-experience']",
    ".vacancy-description-list-item--experience",
];

const EMPLOYMENT: [&str; 2] = [
    "[data-qa='vacancy-view-employment-mode']",
    ".vacancy-description-list-item--employment",
];

const SCHEDULE: [&str; 2] = [
    "[data-qa='vacancy-view-accept-temporary']",
    "[data-qa='work-schedule-by-days']",
];

/// Parse a detail page into its field group. Never fails; missing
/// sections just leave their fields empty.
pub fn parse_detail_page(html: &str) -> DetailFields {
    let document = Html::parse_document(html);
    let root = document.root_element();

    DetailFields {
        description: first_text_block(root, &DESCRIPTION).unwrap_or_default(),
        skills: all_texts(root, &SKILLS),
        experience: first_text(root, &EXPERIENCE),
        employment: first_text(root, &EMPLOYMENT),
        schedule: first_text(root, &SCHEDULE),
        published_at: parse_published_at(&document),
    }
}

/// Best-effort publication date from a `<time datetime="...">` attribute.
fn parse_published_at(document: &Html) -> Option<DateTime<Utc>> {
    let selector = Selector::parse("time[datetime]").ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("datetime"))
        .find_map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{detail_page_html, DetailPageFixture};

    #[test]
    fn full_page_parses_every_field() {
        let html = detail_page_html(
            &DetailPageFixture::new("Build async services in Rust.")
                .with_skills(&["Rust", "PostgreSQL", "Tokio"])
                .with_experience("3–6 years")
                .with_employment("Full time")
                .with_schedule("Remote")
                .with_published_at("2026-08-01T10:00:00+03:00"),
        );

        let details = parse_detail_page(&html);
        assert!(details.description.contains("async services"));
        assert_eq!(details.skills, vec!["Rust", "PostgreSQL", "Tokio"]);
        assert_eq!(details.experience.as_deref(), Some("3–6 years"));
        assert_eq!(details.employment.as_deref(), Some("Full time"));
        assert_eq!(details.schedule.as_deref(), Some("Remote"));
        assert!(details.published_at.is_some());
    }

    #[test]
    fn missing_sections_yield_empty_fields_not_errors() {
        let details = parse_detail_page("<html><body><p>unrelated page</p></body></html>");
        assert!(details.description.is_empty());
        assert!(details.skills.is_empty());
        assert!(details.experience.is_none());
        assert!(details.published_at.is_none());
    }

    #[test]
    fn script_markup_never_leaks_into_description() {
        let html = detail_page_html(&DetailPageFixture::new(
            "Honest text<script>window.tracker()</script> only",
        ));
        let details = parse_detail_page(&html);
        assert!(!details.description.contains("tracker"));
        assert!(details.description.contains("Honest text"));
    }

    #[test]
    fn malformed_datetime_is_ignored() {
        let html = detail_page_html(
            &DetailPageFixture::new("desc").with_published_at("yesterday-ish"),
        );
        assert!(parse_detail_page(&html).published_at.is_none());
    }
}
