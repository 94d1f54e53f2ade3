//! Google Gemini backend.
//!
//! The default primary backend: generous free tier, native JSON output
//! mode, but a low advertised request ceiling that callers must respect.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProviderError, Result};
use crate::prompt::{format_batch_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::provider::{into_batch_results, parse_json_lenient, PostingInput, Provider};

const PROVIDER_NAME: &str = "gemini";

/// Gemini-based provider.
#[derive(Clone)]
pub struct Gemini {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    requests_per_minute: u32,
    max_batch_size: usize,
}

impl Gemini {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            requests_per_minute: 15,
            max_batch_size: 10,
        }
    }

    /// Create from the `GEMINI_API_KEY` environment variable.
    ///
    /// A missing key is not an error here; it surfaces through
    /// [`Provider::is_available`] so selection can fall back.
    pub fn from_env() -> Self {
        let mut gemini = Self::new(String::new());
        gemini.api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        gemini
    }

    /// Set the model (default: gemini-1.5-flash).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().unwrap_or_default();
        let request = GenerateRequest {
            system_instruction: ContentPart::text(system),
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: user.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url, self.model, api_key
            ))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: PROVIDER_NAME,
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: PROVIDER_NAME,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER_NAME,
                reason: e.to_string(),
            })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER_NAME,
                reason: "no candidates in response".to_string(),
            })
    }
}

#[async_trait]
impl Provider for Gemini {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn analyze_one(&self, posting: &PostingInput) -> Result<Option<Value>> {
        let batch = [posting.clone()];
        let user = format_batch_prompt(&batch);
        let raw = self.generate(ANALYSIS_SYSTEM_PROMPT, &user).await?;
        let value = parse_json_lenient(PROVIDER_NAME, &raw)?;
        Ok(into_batch_results(PROVIDER_NAME, value, 1)?.into_iter().next())
    }

    async fn analyze_batch(&self, postings: &[PostingInput]) -> Result<Vec<Value>> {
        if postings.is_empty() {
            return Ok(vec![]);
        }
        let user = format_batch_prompt(postings);
        let raw = self.generate(ANALYSIS_SYSTEM_PROMPT, &user).await?;
        let value = parse_json_lenient(PROVIDER_NAME, &raw)?;
        into_batch_results(PROVIDER_NAME, value, postings.len())
    }
}

// Request/Response types

#[derive(Serialize)]
struct GenerateRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: ContentPart,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct ContentPart {
    parts: Vec<Part>,
}

impl ContentPart {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides() {
        let gemini = Gemini::new("key")
            .with_model("gemini-1.5-pro")
            .with_base_url("http://localhost:9999");
        assert_eq!(gemini.model(), "gemini-1.5-pro");
        assert_eq!(gemini.base_url, "http://localhost:9999");
        assert!(gemini.is_available());
    }

    #[test]
    fn missing_key_reports_unavailable() {
        let gemini = Gemini {
            api_key: None,
            ..Gemini::new("x")
        };
        assert!(!gemini.is_available());
    }
}
