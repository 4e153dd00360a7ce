//! llama.cpp embedding model

use super::options::{parse_provider_options, LlamacppEmbeddingOptions};
use super::provider::ModelConfig;
use super::types::{EmbeddingRequest, EmbeddingResponse};
use crate::http::PostRequest;
use crate::protocol::{EmbedOptions, EmbedResult, EmbeddingUsage, ResponseMetadata};
use crate::providers::adapter::EmbeddingModel;
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use tracing::info;

const EMBEDDINGS_PATH: &str = "/embeddings";

/// Embedding model backed by llama.cpp `/embeddings`
#[derive(Clone)]
pub struct LlamacppEmbeddingModel {
    model_id: String,
    config: ModelConfig,
    max_embeddings_per_call: usize,
}

impl std::fmt::Debug for LlamacppEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlamacppEmbeddingModel")
            .field("model_id", &self.model_id)
            .field("provider", &self.config.provider)
            .field("max_embeddings_per_call", &self.max_embeddings_per_call)
            .finish_non_exhaustive()
    }
}

impl LlamacppEmbeddingModel {
    pub(crate) fn new(model_id: String, config: ModelConfig, max_embeddings_per_call: usize) -> Self {
        Self {
            model_id,
            config,
            max_embeddings_per_call,
        }
    }
}

#[async_trait]
impl EmbeddingModel for LlamacppEmbeddingModel {
    fn provider(&self) -> &str {
        self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn max_embeddings_per_call(&self) -> usize {
        self.max_embeddings_per_call
    }

    fn supports_parallel_calls(&self) -> bool {
        false
    }

    async fn do_embed(&self, options: EmbedOptions) -> ProviderResult<EmbedResult> {
        if options.values.len() > self.max_embeddings_per_call {
            return Err(ProviderError::TooManyValues {
                provider: self.config.provider.to_string(),
                model_id: self.model_id.clone(),
                max_embeddings_per_call: self.max_embeddings_per_call,
                values: options.values.len(),
            });
        }

        let backend: LlamacppEmbeddingOptions =
            parse_provider_options(&options.provider_options)?.unwrap_or_default();

        let body = serde_json::to_value(EmbeddingRequest {
            model: &self.model_id,
            input: &options.values,
            encoding_format: "float",
            embd_normalize: backend.embd_normalize,
        })?;

        let request = PostRequest::new(self.config.url(EMBEDDINGS_PATH), body)
            .with_headers(self.config.headers(&options.headers))
            .with_abort(options.abort_signal.clone());

        info!(
            model = %self.model_id,
            request_id = %request.request_id,
            values = options.values.len(),
            "Embedding values"
        );

        let response = self.config.executor.post_json(request).await?;

        let parsed: EmbeddingResponse =
            serde_json::from_value(response.body.clone()).map_err(|e| {
                ProviderError::InvalidResponse {
                    message: format!("Unexpected embedding response: {}", e),
                }
            })?;

        Ok(EmbedResult {
            embeddings: parsed.data.into_iter().map(|item| item.embedding).collect(),
            usage: parsed.usage.map(|usage| EmbeddingUsage {
                tokens: usage.prompt_tokens,
            }),
            response: ResponseMetadata {
                headers: response.headers,
                body: Some(response.body),
            },
            warnings: Vec::new(),
        })
    }
}
