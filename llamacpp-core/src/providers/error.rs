//! Provider error types and handling

use crate::config::ValidationError;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when calling a model
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The backend option bag failed its declared schema
    #[error("Invalid provider options: {0}")]
    SchemaValidation(#[from] ValidationError),

    /// The backend answered with a non-success status and a parseable error envelope
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        error_type: Option<String>,
        body: String,
        retryable: bool,
    },

    /// The backend answered with a non-success status and no usable error envelope
    #[error("HTTP error {status}")]
    Http { status: u16, body: Option<String> },

    /// Network or connection error
    #[error("Network error: {message}")]
    Network { message: String },

    /// Timeout occurred
    #[error("Request timed out")]
    Timeout,

    /// A success response whose body does not match the expected schema
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// One malformed stream chunk
    #[error("Failed to parse stream chunk: {message}")]
    ChunkParse { message: String, raw: String },

    /// Embedding batch is larger than the model accepts per call
    #[error(
        "Too many values for a single embedding call. The {provider} model \"{model_id}\" can only embed up to {max_embeddings_per_call} values per call, but {values} values were provided."
    )]
    TooManyValues {
        provider: String,
        model_id: String,
        max_embeddings_per_call: usize,
        values: usize,
    },

    /// The abort signal fired
    #[error("Request was cancelled")]
    Cancelled,

    /// The provider offers no model of this kind
    #[error("No such {model_type}: {model_id}")]
    NoSuchModel { model_id: String, model_type: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// Nothing in this crate acts on it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { retryable, .. } => *retryable,
            Self::Http { status, .. } => is_retryable_status(*status),
            Self::Network { .. } | Self::Timeout => true,
            _ => false,
        }
    }
}

/// Statuses worth retrying: request timeout, conflict, rate limit, server errors
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 409 | 429) || status >= 500
}
