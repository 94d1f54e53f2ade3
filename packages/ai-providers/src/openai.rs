//! OpenAI backend.
//!
//! The default fallback: higher request ceiling than the Gemini free tier,
//! selected automatically when the primary has no credential.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProviderError, Result};
use crate::prompt::{format_batch_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::provider::{into_batch_results, parse_json_lenient, PostingInput, Provider};

const PROVIDER_NAME: &str = "openai";

/// OpenAI-based provider.
#[derive(Clone)]
pub struct OpenAi {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    requests_per_minute: u32,
    max_batch_size: usize,
}

impl OpenAi {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            requests_per_minute: 60,
            max_batch_size: 10,
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Self {
        let mut openai = Self::new(String::new());
        openai.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        openai
    }

    /// Set the model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.as_deref().unwrap_or_default()),
            )
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

        let parsed: ChatResponse =
            response.json().await.map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER_NAME,
                reason: e.to_string(),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER_NAME,
                reason: "no choices in response".to_string(),
            })
    }
}

#[async_trait]
impl Provider for OpenAi {
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
        let raw = self.chat(ANALYSIS_SYSTEM_PROMPT, &user).await?;
        let value = parse_json_lenient(PROVIDER_NAME, &raw)?;
        Ok(into_batch_results(PROVIDER_NAME, value, 1)?.into_iter().next())
    }

    async fn analyze_batch(&self, postings: &[PostingInput]) -> Result<Vec<Value>> {
        if postings.is_empty() {
            return Ok(vec![]);
        }
        let user = format_batch_prompt(postings);
        let raw = self.chat(ANALYSIS_SYSTEM_PROMPT, &user).await?;
        let value = parse_json_lenient(PROVIDER_NAME, &raw)?;
        into_batch_results(PROVIDER_NAME, value, postings.len())
    }
}

// Request/Response types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides() {
        let openai = OpenAi::new("sk-test")
            .with_model("gpt-4o")
            .with_base_url("http://localhost:1234");
        assert_eq!(openai.model(), "gpt-4o");
        assert_eq!(openai.base_url, "http://localhost:1234");
    }

    #[test]
    fn declared_limits_are_positive() {
        let openai = OpenAi::new("sk-test");
        assert!(openai.requests_per_minute() > 0);
        assert!(openai.max_batch_size() > 0);
    }
}
