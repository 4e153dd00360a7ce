//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Schema version accepted by this release
pub const CONFIG_VERSION: &str = "0.1";

/// Default address of a locally running llama.cpp server
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlamacppConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Server endpoint and credentials
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Server endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the llama.cpp server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional API key (supports environment variable interpolation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Extra headers sent with every request
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            headers: HashMap::new(),
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
        }
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Largest batch accepted by a single embedding call
    #[serde(default = "default_max_embeddings_per_call")]
    pub max_embeddings_per_call: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            max_embeddings_per_call: default_max_embeddings_per_call(),
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_connect_timeout() -> u64 { 10_000 }
// Local generation can take minutes
fn default_request_timeout() -> u64 { 600_000 }
fn default_max_idle() -> usize { 10 }
fn default_max_embeddings_per_call() -> usize { 32 }

impl Default for LlamacppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            provider: ProviderConfig::default(),
            connection: ConnectionConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl LlamacppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::missing("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::UnsupportedVersion {
                    supported: CONFIG_VERSION.to_string(),
                    found: self.version.clone(),
                },
            ));
        }

        self.provider.validate("provider")?;
        self.connection.validate("connection")?;

        if self.embedding.max_embeddings_per_call == 0 {
            return Err(ValidationError::out_of_range(
                "embedding.max_embeddings_per_call",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl ProviderConfig {
    /// Validate provider configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::missing(format!("{}.base_url", path)));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::invalid_url(
                        format!("{}.base_url", path),
                        format!("URL scheme must be http or https, got: {}", url.scheme()),
                    ));
                }
            }
            Err(e) => {
                return Err(ValidationError::invalid_url(
                    format!("{}.base_url", path),
                    e.to_string(),
                ));
            }
        }

        if let Some(api_key) = &self.api_key {
            if api_key.is_empty() {
                return Err(ValidationError::invalid_format(
                    format!("{}.api_key", path),
                    "API key must not be empty when present",
                ));
            }
        }

        for name in self.headers.keys() {
            if name.trim().is_empty() {
                return Err(ValidationError::invalid_format(
                    format!("{}.headers", path),
                    "Header names must not be empty",
                ));
            }
        }

        Ok(())
    }
}

impl ConnectionConfig {
    /// Validate connection configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}
