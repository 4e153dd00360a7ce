//! Core protocol types for backend-agnostic model calls
//!
//! This module contains the data structures callers use to talk to a
//! language or embedding model without knowing the backend's wire dialect:
//! - Call options (prompt turns, sampling knobs, provider option bag, abort signal)
//! - Unified results (content blocks, usage, finish reason)
//! - Stream events, emitted in a fixed order by streaming calls

use crate::providers::error::ProviderError;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Role of a prompt turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions that guide the model's behavior
    System,
    /// User input
    User,
    /// Earlier model output replayed as context
    Assistant,
}

/// Content of a prompt turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Structured content parts
    Parts(Vec<ContentPart>),
}

/// Individual content part of a structured prompt turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    /// Text content part
    Text { text: String },
    /// File content (images, audio, documents), base64 data or URL
    File { media_type: String, data: String },
    /// Reasoning text produced by an earlier assistant turn
    Reasoning { text: String },
    /// Tool invocation produced by an earlier assistant turn
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        input: Value,
    },
}

/// A single prompt turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the turn
    pub role: MessageRole,

    /// Content of the turn
    pub content: MessageContent,
}

impl Message {
    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a turn from structured parts
    pub fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }
}

impl MessageContent {
    /// Concatenate the text-typed parts without a separator.
    ///
    /// Non-text parts are skipped. Plain text content is returned as is.
    pub fn text_parts_joined(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// Tool definition offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Tool description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON schema of the tool input
    pub input_schema: Value,
}

/// How the model should pick tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
    Required,
    Tool { tool_name: String },
}

/// Backend-specific option bags keyed by provider name (e.g. `"llamacpp"`).
///
/// Values are untyped at this boundary; each provider validates its own
/// entry against a declared schema.
pub type ProviderOptions = HashMap<String, Value>;

/// A backend-agnostic generation request
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Ordered prompt turns
    pub prompt: Vec<Message>,

    /// Maximum tokens to generate
    pub max_output_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f64>,

    /// Nucleus sampling parameter
    pub top_p: Option<f64>,

    /// Top-k sampling parameter
    pub top_k: Option<u32>,

    /// Presence penalty
    pub presence_penalty: Option<f64>,

    /// Frequency penalty
    pub frequency_penalty: Option<f64>,

    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,

    /// Seed for deterministic sampling
    pub seed: Option<i64>,

    /// Tool definitions
    pub tools: Option<Vec<ToolDefinition>>,

    /// Tool choice directive
    pub tool_choice: Option<ToolChoice>,

    /// Extra request headers for this call only
    pub headers: HashMap<String, String>,

    /// Backend-specific option bags
    pub provider_options: ProviderOptions,

    /// Cooperative abort signal
    pub abort_signal: Option<CancellationToken>,
}

impl CallOptions {
    /// Create call options for a prompt
    pub fn new(prompt: Vec<Message>) -> Self {
        Self {
            prompt,
            ..Default::default()
        }
    }

    /// Set max output tokens
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top_p for nucleus sampling
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set top_k
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set stop sequences
    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = Some(stop);
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Add a per-call header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the option bag for one provider
    pub fn with_provider_options(mut self, provider: impl Into<String>, options: Value) -> Self {
        self.provider_options.insert(provider.into(), options);
        self
    }

    /// Attach an abort signal
    pub fn with_abort_signal(mut self, token: CancellationToken) -> Self {
        self.abort_signal = Some(token);
        self
    }
}

/// A non-fatal note about how the call was degraded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CallWarning {
    /// A generic setting the backend cannot honor; it was left out
    UnsupportedSetting {
        setting: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// Free-form warning
    Other { message: String },
}

impl CallWarning {
    /// Create an unsupported-setting warning
    pub fn unsupported_setting(setting: impl Into<String>) -> Self {
        Self::UnsupportedSetting {
            setting: setting.into(),
            details: None,
        }
    }
}

/// The fully-merged, wire-ready request body.
///
/// Built once per call and never mutated afterwards, so it is safe to echo
/// back to the caller as the request that was sent.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ResolvedRequest(Map<String, Value>);

impl ResolvedRequest {
    pub(crate) fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Derive a new request with one more field; `self` is consumed.
    pub(crate) fn with_field(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    /// Look up a wire field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check whether a wire field is present
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// All wire fields
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The body as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Unified finish reason, a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReasonKind {
    /// Natural end or a stop sequence matched
    Stop,
    /// Token limit reached
    Length,
    /// Unknown, absent, or anything else
    Other,
}

/// Finish reason with the backend stop-tag kept alongside
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishReason {
    pub unified: FinishReasonKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl FinishReason {
    /// Finish reason used when the backend never reported a stop-tag
    pub fn unknown() -> Self {
        Self {
            unified: FinishReasonKind::Other,
            raw: None,
        }
    }
}

impl Default for FinishReason {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Token usage.
///
/// Every count is optional: absence means "not reported", never zero.
/// `total_tokens` is present exactly when both other counts are, and is
/// their sum; the only constructor enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Usage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

impl Usage {
    /// Usage before the backend reported anything
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Build usage from backend-reported counts
    pub fn from_counts(input_tokens: Option<u64>, output_tokens: Option<u64>) -> Self {
        let total_tokens = match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input.saturating_add(output)),
            _ => None,
        };
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    pub fn input_tokens(&self) -> Option<u64> {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> Option<u64> {
        self.output_tokens
    }

    pub fn total_tokens(&self) -> Option<u64> {
        self.total_tokens
    }
}

/// A content block in a unified result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Content {
    Text { text: String },
}

/// The request that was sent
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RequestMetadata {
    pub body: ResolvedRequest,
}

/// Raw response envelope, opaque to the normalizers
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResponseMetadata {
    pub headers: HashMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Result of a one-shot generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateResult {
    pub content: Vec<Content>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    pub warnings: Vec<CallWarning>,
    pub request: RequestMetadata,
    pub response: ResponseMetadata,
}

impl GenerateResult {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                Content::Text { text } => text.as_str(),
            })
            .collect()
    }
}

/// Event emitted by a streaming call.
///
/// Order: exactly one `StreamStart` first, then deltas and errors in input
/// order, then exactly one `TextEnd` and one `Finish`.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    StreamStart { warnings: Vec<CallWarning> },
    TextDelta { id: String, delta: String },
    TextEnd { id: String },
    Error { error: ProviderError },
    Finish { finish_reason: FinishReason, usage: Usage },
}

impl StreamEvent {
    /// Wire-style name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::StreamStart { .. } => "stream-start",
            StreamEvent::TextDelta { .. } => "text-delta",
            StreamEvent::TextEnd { .. } => "text-end",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Finish { .. } => "finish",
        }
    }
}

/// Single-pass stream of events; it cannot be restarted or replayed
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Result of a streaming generation
pub struct StreamResult {
    pub stream: EventStream,
    pub request: RequestMetadata,
    pub response: ResponseMetadata,
}

impl fmt::Debug for StreamResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResult")
            .field("request", &self.request)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

/// A batch embedding request
#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
    /// Values to embed, one vector each
    pub values: Vec<String>,

    /// Extra request headers for this call only
    pub headers: HashMap<String, String>,

    /// Backend-specific option bags
    pub provider_options: ProviderOptions,

    /// Cooperative abort signal
    pub abort_signal: Option<CancellationToken>,
}

impl EmbedOptions {
    /// Create embed options for a batch of values
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the option bag for one provider
    pub fn with_provider_options(mut self, provider: impl Into<String>, options: Value) -> Self {
        self.provider_options.insert(provider.into(), options);
        self
    }

    /// Attach an abort signal
    pub fn with_abort_signal(mut self, token: CancellationToken) -> Self {
        self.abort_signal = Some(token);
        self
    }
}

/// Embedding token usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmbeddingUsage {
    pub tokens: u64,
}

/// Result of an embedding call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedResult {
    pub embeddings: Vec<Vec<f32>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,

    pub response: ResponseMetadata,
    pub warnings: Vec<CallWarning>,
}
