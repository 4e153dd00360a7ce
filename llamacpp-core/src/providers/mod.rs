//! Model abstraction and the llama.cpp backend
//!
//! This module holds the backend-agnostic model traits, the shared error
//! type, and the llama.cpp implementation of both.

pub mod adapter;
pub mod error;
pub mod llamacpp;

pub use adapter::{EmbeddingModel, LanguageModel};
pub use error::{ProviderError, ProviderResult};

// Re-export the concrete provider
pub use llamacpp::{create_llamacpp, LlamacppProvider, LlamacppProviderSettings};
