//! llama.cpp Core Library
//!
//! This crate translates backend-agnostic chat and embedding calls into the
//! llama.cpp HTTP server's dialect and normalizes its one-shot and streamed
//! responses back into a small, stable result shape.

pub mod config;
pub mod http;
pub mod protocol;
pub mod providers;

pub use protocol::{
    CallOptions, CallWarning, EmbedOptions, EmbedResult, FinishReason, FinishReasonKind,
    GenerateResult, Message, StreamEvent, StreamResult, Usage,
};
pub use providers::{
    create_llamacpp, EmbeddingModel, LanguageModel, LlamacppProvider, LlamacppProviderSettings,
    ProviderError, ProviderResult,
};

/// Returns the version of the llama.cpp Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
