//! Interchangeable AI backends for structured job-posting analysis.
//!
//! One call = one prompt carrying up to `max_batch_size` postings;
//! the response is a JSON array with one structured object per posting,
//! positionally matched to the request. Two backends are provided
//! (Gemini and OpenAI) behind the [`Provider`] trait; [`select_provider`]
//! picks the configured primary and falls back once, failing fast when
//! neither has a credential.
//!
//! # Example
//!
//! ```rust,ignore
//! use ai_providers::{select_provider, PostingInput};
//!
//! let provider = select_provider("gemini", "openai")?;
//! let results = provider
//!     .analyze_batch(&[PostingInput::new(0, "Rust engineer...", vec![])])
//!     .await?;
//! ```

pub mod error;
pub mod gemini;
pub mod openai;
pub mod prompt;
pub mod provider;

pub use error::{ProviderError, Result};
pub use gemini::Gemini;
pub use openai::OpenAi;
pub use prompt::{format_batch_prompt, ANALYSIS_SYSTEM_PROMPT};
pub use provider::{select_provider, PostingInput, Provider};
