//! Phase-3 structured enrichment produced by an AI provider.
//!
//! The enum whitelists here double as the validation schema: a provider
//! result that uses a value outside them fails deserialization and the
//! record is dropped from that batch (see `enrich::schema`).

use serde::{Deserialize, Serialize};

/// Job category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Development,
    Qa,
    Devops,
    Analytics,
    Design,
    Management,
    DataScience,
    Security,
    Support,
    Other,
}

/// Seniority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Intern,
    Junior,
    Middle,
    Senior,
    Lead,
}

/// Work format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkFormat {
    Remote,
    Hybrid,
    Office,
}

/// Contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

/// One technology mentioned by the posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechStackEntry {
    pub name: String,
    pub category: String,
    pub required: bool,
}

/// AI-estimated salary recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryEstimate {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub confidence: f64,
    pub rationale: String,
}

/// The complete phase-3 field group.
///
/// Written as one atomic update together with `ai_enriched_at`; a record
/// is either fully enriched or not enriched at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrichment {
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    pub company_name: Option<String>,
    pub company_size: Option<String>,
    pub company_industry: Option<String>,
    pub company_type: Option<String>,
    pub seniority: Seniority,
    #[serde(default)]
    pub tech_stack: Vec<TechStackEntry>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub work_format: WorkFormat,
    pub contract_type: ContractType,
    pub salary_estimate: Option<SalaryEstimate>,
    pub summary: Option<String>,
}
