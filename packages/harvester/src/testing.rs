//! Test doubles and fixtures shared by unit and integration tests.
//!
//! Lives in the library (not behind `cfg(test)`) so the `tests/`
//! directory can use the same mocks as the inline test modules.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ai_providers::{PostingInput, Provider, ProviderError};
use async_trait::async_trait;
use serde_json::Value;

use crate::traits::JobStore;
use crate::types::{DetailFields, StubPosting};

/// A scripted AI provider.
///
/// Each `analyze_batch` call pops the next scripted response; calls with
/// nothing scripted fail with an API error, which makes the unscripted
/// case double as a provider-outage simulation.
pub struct MockProvider {
    batches: Mutex<VecDeque<Vec<Value>>>,
    calls: Arc<Mutex<Vec<usize>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(VecDeque::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the response for the next batch call.
    pub fn with_batch(self, results: Vec<Value>) -> Self {
        self.batches.lock().unwrap().push_back(results);
        self
    }

    /// Handle to the recorded batch sizes, usable after the provider has
    /// been boxed and handed to an engine.
    pub fn call_log(&self) -> Arc<Mutex<Vec<usize>>> {
        self.calls.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-1"
    }

    fn requests_per_minute(&self) -> u32 {
        600
    }

    fn max_batch_size(&self) -> usize {
        10
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn analyze_one(
        &self,
        posting: &PostingInput,
    ) -> ai_providers::Result<Option<Value>> {
        let results = self.analyze_batch(std::slice::from_ref(posting)).await?;
        Ok(results.into_iter().next())
    }

    async fn analyze_batch(&self, postings: &[PostingInput]) -> ai_providers::Result<Vec<Value>> {
        self.calls.lock().unwrap().push(postings.len());
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ProviderError::Api {
                provider: "mock",
                status: 503,
                body: "no scripted response".to_string(),
            })
    }
}

/// Seed a store with a detail-complete posting ready for enrichment.
pub async fn detailed_posting(store: &dyn JobStore, source: &str, external_id: &str) {
    store
        .upsert_stub(&stub_posting(source, external_id))
        .await
        .expect("stub upsert");
    let details = DetailFields {
        description: "Design and build backend services in Rust.".to_string(),
        skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
        experience: Some("3–6 years".to_string()),
        ..Default::default()
    };
    store
        .apply_details(source, external_id, &details)
        .await
        .expect("details apply");
}

/// A minimal valid stub for seeding stores in tests.
pub fn stub_posting(source: &str, external_id: &str) -> StubPosting {
    StubPosting {
        source: source.to_string(),
        external_id: external_id.to_string(),
        title: format!("Posting {external_id}"),
        company: "Acme".to_string(),
        url: format!("https://hh.example/vacancy/{external_id}"),
        salary: None,
        location: None,
        remote: false,
    }
}

/// One listing card in a fixture page.
pub struct ListingCardFixture {
    id: String,
    title: String,
    company: Option<String>,
    salary: Option<String>,
    location: Option<String>,
    malformed: bool,
}

impl ListingCardFixture {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            company: None,
            salary: None,
            location: None,
            malformed: false,
        }
    }

    /// A card with no detail link, which a parser must skip.
    pub fn malformed() -> Self {
        let mut card = Self::new("", "");
        card.malformed = true;
        card
    }

    pub fn with_company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }

    pub fn with_salary(mut self, salary: &str) -> Self {
        self.salary = Some(salary.to_string());
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    fn render(&self) -> String {
        if self.malformed {
            return r#"<div data-qa="vacancy-serp__vacancy"><span>promo block</span></div>"#
                .to_string();
        }
        let mut card = format!(
            r#"<div data-qa="vacancy-serp__vacancy"><a href="/vacancy/{}?from=serp">{}</a>"#,
            self.id, self.title
        );
        if let Some(company) = &self.company {
            card.push_str(&format!(
                r#"<div data-qa="vacancy-serp__vacancy-employer">{company}</div>"#
            ));
        }
        if let Some(salary) = &self.salary {
            card.push_str(&format!(
                r#"<div data-qa="vacancy-serp__vacancy-compensation">{salary}</div>"#
            ));
        }
        if let Some(location) = &self.location {
            card.push_str(&format!(
                r#"<div data-qa="vacancy-serp__vacancy-address">{location}</div>"#
            ));
        }
        card.push_str("</div>");
        card
    }
}

/// Render a search-results page from card fixtures.
pub fn listing_page_html(cards: &[ListingCardFixture], has_next: bool) -> String {
    let mut body = String::from("<html><body><main>");
    for card in cards {
        body.push_str(&card.render());
    }
    if has_next {
        body.push_str(r#"<a data-qa="pager-next" href="?page=1">next</a>"#);
    }
    body.push_str("</main></body></html>");
    body
}

/// One detail page in fixture form.
pub struct DetailPageFixture {
    description: String,
    skills: Vec<String>,
    experience: Option<String>,
    employment: Option<String>,
    schedule: Option<String>,
    published_at: Option<String>,
}

impl DetailPageFixture {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            skills: Vec::new(),
            experience: None,
            employment: None,
            schedule: None,
            published_at: None,
        }
    }

    pub fn with_skills(mut self, skills: &[&str]) -> Self {
        self.skills = skills.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_experience(mut self, experience: &str) -> Self {
        self.experience = Some(experience.to_string());
        self
    }

    pub fn with_employment(mut self, employment: &str) -> Self {
        self.employment = Some(employment.to_string());
        self
    }

    pub fn with_schedule(mut self, schedule: &str) -> Self {
        self.schedule = Some(schedule.to_string());
        self
    }

    pub fn with_published_at(mut self, raw: &str) -> Self {
        self.published_at = Some(raw.to_string());
        self
    }
}

/// Render a detail page from its fixture.
pub fn detail_page_html(fixture: &DetailPageFixture) -> String {
    let mut body = String::from("<html><body>");
    body.push_str(&format!(
        r#"<div data-qa="vacancy-description">{}</div>"#,
        fixture.description
    ));
    for skill in &fixture.skills {
        body.push_str(&format!(r#"<span data-qa="skills-element">{skill}</span>"#));
    }
    if let Some(experience) = &fixture.experience {
        body.push_str(&format!(
            r#"<span data-qa="vacancy-experience">{experience}</span>"#
        ));
    }
    if let Some(employment) = &fixture.employment {
        body.push_str(&format!(
            r#"<p data-qa="vacancy-view-employment-mode">{employment}</p>"#
        ));
    }
    if let Some(schedule) = &fixture.schedule {
        body.push_str(&format!(
            r#"<p data-qa="work-schedule-by-days">{schedule}</p>"#
        ));
    }
    if let Some(published_at) = &fixture.published_at {
        body.push_str(&format!(
            r#"<time datetime="{published_at}">recently</time>"#
        ));
    }
    body.push_str("</body></html>");
    body
}
