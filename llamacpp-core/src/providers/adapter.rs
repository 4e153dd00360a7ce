//! Model traits
//!
//! Defines the backend-agnostic seams callers program against. Each backend
//! supplies a language model and, optionally, an embedding model.

use crate::protocol::{CallOptions, EmbedOptions, EmbedResult, GenerateResult, StreamResult};
use crate::providers::error::ProviderResult;
use async_trait::async_trait;

/// A text generation model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name, e.g. `llamacpp.chat`
    fn provider(&self) -> &str;

    /// Model id as given by the caller
    fn model_id(&self) -> &str;

    /// Generate a complete response in one call
    async fn do_generate(&self, options: CallOptions) -> ProviderResult<GenerateResult>;

    /// Generate a response as an ordered stream of events.
    ///
    /// Option and transport failures are returned here, before any event.
    async fn do_stream(&self, options: CallOptions) -> ProviderResult<StreamResult>;
}

/// A text embedding model
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Provider name, e.g. `llamacpp.embedding`
    fn provider(&self) -> &str;

    /// Model id as given by the caller
    fn model_id(&self) -> &str;

    /// Largest batch accepted by [`EmbeddingModel::do_embed`]
    fn max_embeddings_per_call(&self) -> usize;

    /// Whether callers may issue several embed calls at once
    fn supports_parallel_calls(&self) -> bool;

    /// Embed a batch of values; larger batches are rejected, never split
    async fn do_embed(&self, options: EmbedOptions) -> ProviderResult<EmbedResult>;
}
