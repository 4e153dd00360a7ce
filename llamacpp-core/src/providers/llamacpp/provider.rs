//! llama.cpp provider factory

use super::chat::LlamacppChatModel;
use super::embedding::LlamacppEmbeddingModel;
use crate::config::{
    load_api_key, ConnectionConfig, LlamacppConfig, SecretString, DEFAULT_BASE_URL,
};
use crate::http::{HttpClient, HttpExecutor};
use crate::providers::error::{ProviderError, ProviderResult};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Provider name reported by chat models
pub const CHAT_PROVIDER: &str = "llamacpp.chat";

/// Provider name reported by embedding models
pub const EMBEDDING_PROVIDER: &str = "llamacpp.embedding";

/// Default batch limit for one embedding call
pub const DEFAULT_MAX_EMBEDDINGS_PER_CALL: usize = 32;

const USER_AGENT_SUFFIX: &str = concat!("llamacpp-core/", env!("CARGO_PKG_VERSION"));

/// Settings for [`create_llamacpp`]
#[derive(Debug, Clone)]
pub struct LlamacppProviderSettings {
    /// Server URL; defaults to `http://127.0.0.1:8080`
    pub base_url: Option<String>,

    /// API key; falls back to `LLAMACPP_API_KEY`
    pub api_key: Option<SecretString>,

    /// Headers sent with every request
    pub headers: HashMap<String, String>,

    /// Timeouts and pooling for the built-in HTTP client
    pub connection: ConnectionConfig,

    /// Batch limit for embedding models
    pub max_embeddings_per_call: usize,
}

impl Default for LlamacppProviderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            headers: HashMap::new(),
            connection: ConnectionConfig::default(),
            max_embeddings_per_call: DEFAULT_MAX_EMBEDDINGS_PER_CALL,
        }
    }
}

impl LlamacppProviderSettings {
    /// Settings from a loaded configuration file
    pub fn from_config(config: &LlamacppConfig) -> Self {
        Self {
            base_url: Some(config.provider.base_url.clone()),
            api_key: config.provider.api_key.clone(),
            headers: config.provider.headers.clone(),
            connection: config.connection.clone(),
            max_embeddings_per_call: config.embedding.max_embeddings_per_call,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_max_embeddings_per_call(mut self, max: usize) -> Self {
        self.max_embeddings_per_call = max;
        self
    }
}

/// Everything a model needs to issue a call
#[derive(Clone)]
pub(crate) struct ModelConfig {
    pub provider: &'static str,
    pub base_url: String,
    pub headers: Arc<ProviderHeaders>,
    pub executor: Arc<dyn HttpExecutor>,
}

impl ModelConfig {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Provider headers with the per-call headers on top
    pub fn headers(&self, call_headers: &HashMap<String, String>) -> HashMap<String, String> {
        combine_headers(self.headers.resolve(), call_headers)
    }
}

/// Headers shared by every model of one provider.
///
/// Resolved on every call so a key exported after construction is picked up.
#[derive(Debug)]
pub(crate) struct ProviderHeaders {
    base: HashMap<String, String>,
    api_key: Option<SecretString>,
}

impl ProviderHeaders {
    pub fn resolve(&self) -> HashMap<String, String> {
        let mut headers = self.base.clone();

        if let Some(key) = load_api_key(self.api_key.as_ref()) {
            set_header(&mut headers, "Authorization", key.bearer());
        }

        with_user_agent_suffix(headers, USER_AGENT_SUFFIX)
    }
}

/// Factory for llama.cpp chat and embedding models
#[derive(Clone)]
pub struct LlamacppProvider {
    base_url: String,
    headers: Arc<ProviderHeaders>,
    executor: Arc<dyn HttpExecutor>,
    max_embeddings_per_call: usize,
}

impl std::fmt::Debug for LlamacppProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlamacppProvider")
            .field("base_url", &self.base_url)
            .field("max_embeddings_per_call", &self.max_embeddings_per_call)
            .finish_non_exhaustive()
    }
}

/// Create a provider backed by the built-in reqwest client
pub fn create_llamacpp(settings: LlamacppProviderSettings) -> ProviderResult<LlamacppProvider> {
    let client = HttpClient::from_connection(&settings.connection)?;
    let provider = LlamacppProvider::with_executor(settings, Arc::new(client));

    url::Url::parse(&provider.base_url).map_err(|e| {
        ProviderError::Configuration(format!("Invalid base URL '{}': {}", provider.base_url, e))
    })?;

    Ok(provider)
}

impl LlamacppProvider {
    /// Create a provider that sends every request through `executor`
    pub fn with_executor(settings: LlamacppProviderSettings, executor: Arc<dyn HttpExecutor>) -> Self {
        let base_url = settings
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string();

        debug!("Creating llama.cpp provider for {}", base_url);

        Self {
            base_url,
            headers: Arc::new(ProviderHeaders {
                base: settings.headers,
                api_key: settings.api_key,
            }),
            executor,
            max_embeddings_per_call: settings.max_embeddings_per_call,
        }
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A chat model served by `POST /completion`
    pub fn language_model(&self, model_id: impl Into<String>) -> LlamacppChatModel {
        LlamacppChatModel::new(model_id.into(), self.model_config(CHAT_PROVIDER))
    }

    /// Alias of [`LlamacppProvider::language_model`]
    pub fn chat(&self, model_id: impl Into<String>) -> LlamacppChatModel {
        self.language_model(model_id)
    }

    /// An embedding model served by `POST /embeddings`
    pub fn embedding(&self, model_id: impl Into<String>) -> LlamacppEmbeddingModel {
        LlamacppEmbeddingModel::new(
            model_id.into(),
            self.model_config(EMBEDDING_PROVIDER),
            self.max_embeddings_per_call,
        )
    }

    /// Alias of [`LlamacppProvider::embedding`]
    pub fn text_embedding(&self, model_id: impl Into<String>) -> LlamacppEmbeddingModel {
        self.embedding(model_id)
    }

    /// Alias of [`LlamacppProvider::embedding`]
    pub fn text_embedding_model(&self, model_id: impl Into<String>) -> LlamacppEmbeddingModel {
        self.embedding(model_id)
    }

    /// llama.cpp serves no image models; always fails with `NoSuchModel`
    pub fn image_model(&self, model_id: impl Into<String>) -> ProviderResult<Infallible> {
        Err(ProviderError::NoSuchModel {
            model_id: model_id.into(),
            model_type: "imageModel".to_string(),
        })
    }

    fn model_config(&self, provider: &'static str) -> ModelConfig {
        ModelConfig {
            provider,
            base_url: self.base_url.clone(),
            headers: Arc::clone(&self.headers),
            executor: Arc::clone(&self.executor),
        }
    }
}

/// Merge header maps; later names win, compared case-insensitively
pub(crate) fn combine_headers(
    mut base: HashMap<String, String>,
    overrides: &HashMap<String, String>,
) -> HashMap<String, String> {
    for (name, value) in overrides {
        set_header(&mut base, name, value.clone());
    }
    base
}

fn set_header(headers: &mut HashMap<String, String>, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

fn with_user_agent_suffix(
    mut headers: HashMap<String, String>,
    suffix: &str,
) -> HashMap<String, String> {
    let existing = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
        .map(|(_, value)| value.clone());

    let value = match existing {
        Some(current) if !current.is_empty() => format!("{} {}", current, suffix),
        _ => suffix.to_string(),
    };
    set_header(&mut headers, "User-Agent", value);
    headers
}
