//! Typed errors for provider operations.

use thiserror::Error;

/// Errors that can occur when talking to an AI backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP transport failure (connect, timeout, TLS).
    #[error("request to {provider} failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The API answered with a non-success status.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The response body could not be parsed into the expected shape.
    #[error("{provider} returned a malformed response: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    /// The batch response does not line up with the request.
    #[error("{provider} returned {got} results for a batch of {expected}")]
    BatchLengthMismatch {
        provider: &'static str,
        expected: usize,
        got: usize,
    },

    /// No configured backend has a usable credential.
    #[error("no AI provider available: tried {primary} and {fallback}")]
    NoneAvailable { primary: String, fallback: String },

    /// A provider name in configuration is not recognized.
    #[error("unknown provider: {name}")]
    UnknownProvider { name: String },
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
