//! Protocol module for backend-agnostic request/response structures
//!
//! This module defines the shapes callers exchange with models.
//! These structures are designed to be:
//! - Backend-agnostic
//! - Stable while the backend schema evolves
//! - Streaming-aware through ordered, typed events

pub mod types;

pub use types::{
    CallOptions, CallWarning, Content, ContentPart, EmbedOptions, EmbedResult, EmbeddingUsage,
    EventStream, FinishReason, FinishReasonKind, GenerateResult, Message, MessageContent,
    MessageRole, ProviderOptions, RequestMetadata, ResolvedRequest, ResponseMetadata,
    StreamEvent, StreamResult, ToolChoice, ToolDefinition, Usage,
};
