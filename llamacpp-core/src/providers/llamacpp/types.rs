//! llama.cpp server wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of a non-streaming `/completion` call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    #[serde(default)]
    pub stop_type: Option<String>,
    #[serde(default)]
    pub tokens_evaluated: Option<u64>,
    #[serde(default)]
    pub tokens_predicted: Option<u64>,
    #[serde(default)]
    pub timings: Option<CompletionTimings>,
}

/// One server-sent event of a streaming `/completion` call
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub stop_type: Option<String>,
    #[serde(default)]
    pub tokens_evaluated: Option<u64>,
    #[serde(default)]
    pub tokens_predicted: Option<u64>,
    /// Present once the server reports usage
    #[serde(default)]
    pub timings: Option<CompletionTimings>,
}

/// Timing block; its presence is what matters
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CompletionTimings {
    #[serde(default)]
    pub predicted_n: Option<u64>,
}

/// Error envelope of a failed call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorDetail {
    /// Number or string on the wire
    #[serde(default)]
    pub code: Option<Value>,
    pub message: String,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

/// Body of an `/embeddings` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
    pub encoding_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embd_normalize: Option<i64>,
}

/// Response of an `/embeddings` call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub usage: Option<EmbeddingUsageResponse>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddingUsageResponse {
    pub prompt_tokens: u64,
}
