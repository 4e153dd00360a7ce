//! llama.cpp provider implementation

pub mod chat;
pub mod converter;
pub mod embedding;
pub mod error;
pub mod finish_reason;
pub mod options;
pub mod provider;
pub mod request;
pub mod streaming;
pub mod types;

pub use chat::LlamacppChatModel;
pub use embedding::LlamacppEmbeddingModel;
pub use finish_reason::map_finish_reason;
pub use options::{
    parse_provider_options, BiasValue, LlamacppEmbeddingOptions, LlamacppLanguageModelOptions,
    LogitBias, LoraAdapter, TokenRef, PROVIDER_OPTIONS_KEY,
};
pub use provider::{
    create_llamacpp, LlamacppProvider, LlamacppProviderSettings, CHAT_PROVIDER,
    DEFAULT_MAX_EMBEDDINGS_PER_CALL, EMBEDDING_PROVIDER,
};
pub use request::{flatten_prompt, resolve_call_options, ResolvedCall};
pub use streaming::{normalize_stream, StreamState};
