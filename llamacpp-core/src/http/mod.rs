//! HTTP transport for talking to a llama.cpp server
//!
//! This module implements the transport layer the model facades call, handling:
//! - Connection pooling and client management
//! - JSON and event-stream POST requests
//! - Cancellation through an abort token
//! - Error mapping and request ID correlation

pub mod client;
pub mod error;

pub use client::HttpClient;

use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A single POST to the backend
#[derive(Debug, Clone)]
pub struct PostRequest {
    /// Full endpoint URL
    pub url: String,

    /// Headers to send, already merged and resolved
    pub headers: HashMap<String, String>,

    /// JSON body
    pub body: Value,

    /// Optional abort signal
    pub abort: Option<CancellationToken>,

    /// Unique request ID for correlation
    pub request_id: Uuid,
}

impl PostRequest {
    /// Create a request with a generated request ID
    pub fn new(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            body,
            abort: None,
            request_id: Uuid::new_v4(),
        }
    }

    /// Replace the headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Attach an abort signal
    pub fn with_abort(mut self, abort: Option<CancellationToken>) -> Self {
        self.abort = abort;
        self
    }
}

/// A successful JSON response
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// A successful event-stream response.
///
/// `events` yields the raw `data` payload of each server-sent event; a
/// transport failure mid-stream arrives as an `Err` item.
pub struct EventStreamResponse {
    pub headers: HashMap<String, String>,
    pub events: BoxStream<'static, ProviderResult<String>>,
}

impl std::fmt::Debug for EventStreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamResponse")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP executors
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// POST a JSON body and parse the JSON response
    async fn post_json(&self, request: PostRequest) -> ProviderResult<JsonResponse>;

    /// POST a JSON body and open a server-sent event stream.
    ///
    /// A non-success status fails here, before any event is produced.
    async fn post_event_stream(&self, request: PostRequest) -> ProviderResult<EventStreamResponse>;
}
