//! Prompt construction shared by all backends.
//!
//! The analysis contract is identical across providers: the same system
//! instructions, the same output schema, the same positional guarantees.
//! Keeping the prompt here means a backend only has to know how to send
//! text and return text.

use crate::provider::PostingInput;

/// System instructions describing the expected output schema.
///
/// Each result object must echo the posting's `index` so the caller can
/// match results positionally even if the model reorders the array.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a job-posting analyst. For EVERY posting you receive, produce one JSON object with exactly these fields:

{
  "index": <number, copied verbatim from the posting header>,
  "category": "development" | "qa" | "devops" | "analytics" | "design" | "management" | "data_science" | "security" | "support" | "other",
  "tags": ["short topical tags", ...],
  "company_name": "normalized company name" | null,
  "company_size": "startup" | "small" | "medium" | "large" | null,
  "company_industry": "free text" | null,
  "company_type": "product" | "outsource" | "outstaff" | "agency" | null,
  "seniority": "intern" | "junior" | "middle" | "senior" | "lead",
  "tech_stack": [{"name": "PostgreSQL", "category": "database", "required": true}, ...],
  "benefits": ["listed benefits", ...],
  "work_format": "remote" | "hybrid" | "office",
  "contract_type": "full_time" | "part_time" | "contract" | "internship",
  "salary_estimate": {"from": <number>, "to": <number>, "confidence": <0.0-1.0>, "rationale": "one sentence"} | null,
  "summary": "2-3 sentence plain-language summary of the role"
}

Return ONLY a JSON array containing one object per posting, in the same order the postings were given. Do not wrap the array in prose. Use null for anything the posting does not state; never invent facts."#;

/// Render a batch of postings as the user message.
pub fn format_batch_prompt(postings: &[PostingInput]) -> String {
    let mut out = String::with_capacity(postings.len() * 512);
    out.push_str(&format!(
        "Analyze the following {} job posting(s).\n",
        postings.len()
    ));
    for posting in postings {
        out.push_str(&format!(
            "\n--- POSTING index={} ---\nSkills: {}\nDescription:\n{}\n",
            posting.index,
            if posting.skills.is_empty() {
                "(none listed)".to_string()
            } else {
                posting.skills.join(", ")
            },
            truncate(&posting.description, 6000),
        ));
    }
    out
}

/// Long descriptions are clipped so a large batch stays inside the
/// context window; 6k chars keeps the salient sections of any posting.
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_prompt_carries_every_index() {
        let postings = vec![
            PostingInput::new(0, "Rust developer", vec!["Rust".into()]),
            PostingInput::new(7, "QA engineer", vec![]),
        ];
        let prompt = format_batch_prompt(&postings);
        assert!(prompt.contains("index=0"));
        assert!(prompt.contains("index=7"));
        assert!(prompt.contains("(none listed)"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "привет мир";
        assert_eq!(truncate(text, 6), "привет");
        assert_eq!(truncate("short", 100), "short");
    }
}
