//! HTTP client implementation using reqwest

use crate::config::{redact_header, ConnectionConfig};
use crate::http::{EventStreamResponse, HttpExecutor, JsonResponse, PostRequest};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Future, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("llamacpp-core/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("max_response_size", &self.max_response_size)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default connection settings
    pub fn new() -> ProviderResult<Self> {
        Self::from_connection(&ConnectionConfig::default())
    }

    /// Create a client from the `connection` section of a config file
    pub fn from_connection(connection: &ConnectionConfig) -> ProviderResult<Self> {
        Self::with_config(
            Duration::from_millis(connection.connect_timeout_ms),
            Duration::from_millis(connection.request_timeout_ms),
            connection.max_idle_per_host,
        )
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(
        connect_timeout: Duration,
        request_timeout: Duration,
        max_idle_per_host: usize,
    ) -> ProviderResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client: Arc::new(client),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// Send the POST, racing it against the abort signal
    async fn send(&self, request: &PostRequest) -> ProviderResult<Response> {
        let request_id = request.request_id;
        debug!("Request URL: {} [request_id: {}]", request.url, request_id);

        let mut req_builder = self.client.post(&request.url).json(&request.body);

        for (key, value) in &request.headers {
            debug!("Request header {}: {}", key, redact_header(key, value));
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }

        // Add request ID header for correlation
        req_builder = req_builder.header("X-Request-ID", request_id.to_string());

        let response = with_abort(request.abort.as_ref(), async {
            req_builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    warn!("Request timeout [request_id: {}]", request_id);
                    ProviderError::Timeout
                } else if e.is_connect() {
                    error!("Connection error [request_id: {}]: {}", request_id, e);
                    ProviderError::Network {
                        message: format!("Connection failed: {} [request_id: {}]", e, request_id),
                    }
                } else {
                    error!("Request error [request_id: {}]: {}", request_id, e);
                    ProviderError::Network {
                        message: format!("{} [request_id: {}]", e, request_id),
                    }
                }
            })
        })
        .await?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        // Check for non-success status codes
        if !status.is_success() {
            // Try to get response body for error details
            let body = response.text().await.ok();

            warn!(
                "Request failed with status {} [request_id: {}]",
                status, request_id
            );

            return Err(crate::http::error::map_http_error(status, body, request_id));
        }

        Ok(response)
    }

    /// Validate response content type
    fn validate_content_type(response: &Response) -> ProviderResult<()> {
        if let Some(content_type) = response.headers().get("content-type") {
            let content_type_str = content_type.to_str().unwrap_or("").to_lowercase();

            if !content_type_str.contains("application/json") {
                return Err(ProviderError::InvalidResponse {
                    message: format!("Expected application/json, got: {}", content_type_str),
                });
            }
        }

        Ok(())
    }

    /// Check response size to prevent OOM
    fn check_content_length(&self, response: &Response) -> ProviderResult<()> {
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(ProviderError::InvalidResponse {
                    message: format!(
                        "Response size {} exceeds maximum {}",
                        content_length, self.max_response_size
                    ),
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl HttpExecutor for HttpClient {
    async fn post_json(&self, request: PostRequest) -> ProviderResult<JsonResponse> {
        let request_id = request.request_id;
        info!("Executing JSON request [request_id: {}]", request_id);

        let response = self.send(&request).await?;

        Self::validate_content_type(&response)?;
        self.check_content_length(&response)?;

        let headers = response_headers(response.headers());

        let response_text = with_abort(request.abort.as_ref(), async {
            response.text().await.map_err(|e| ProviderError::Network {
                message: format!(
                    "Failed to read response body: {} [request_id: {}]",
                    e, request_id
                ),
            })
        })
        .await?;

        // Check response size after reading
        if response_text.len() > self.max_response_size {
            return Err(ProviderError::InvalidResponse {
                message: format!(
                    "Response size {} exceeds maximum {} [request_id: {}]",
                    response_text.len(),
                    self.max_response_size,
                    request_id
                ),
            });
        }

        let body = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse response [request_id: {}]: {}", request_id, e);
            ProviderError::InvalidResponse {
                message: format!("Invalid response format: {} [request_id: {}]", e, request_id),
            }
        })?;

        info!("Request completed successfully [request_id: {}]", request_id);

        Ok(JsonResponse { headers, body })
    }

    async fn post_event_stream(&self, request: PostRequest) -> ProviderResult<EventStreamResponse> {
        let request_id = request.request_id;
        info!("Opening event stream [request_id: {}]", request_id);

        let response = self.send(&request).await?;
        let headers = response_headers(response.headers());

        let abort = request.abort.clone();
        let mut events = Box::pin(response.bytes_stream().eventsource());

        let stream = async_stream::stream! {
            loop {
                // Outer None means the abort signal fired
                let next = match &abort {
                    Some(token) => tokio::select! {
                        biased;
                        _ = token.cancelled() => None,
                        item = events.next() => Some(item),
                    },
                    None => Some(events.next().await),
                };

                match next {
                    None => {
                        debug!("Event stream aborted [request_id: {}]", request_id);
                        yield Err(ProviderError::Cancelled);
                        break;
                    }
                    Some(None) => {
                        debug!("Event stream finished [request_id: {}]", request_id);
                        break;
                    }
                    Some(Some(Ok(event))) => {
                        if event.data == "[DONE]" {
                            break;
                        }
                        yield Ok(event.data);
                    }
                    Some(Some(Err(e))) => {
                        error!("Event stream error [request_id: {}]: {}", request_id, e);
                        yield Err(ProviderError::Network {
                            message: format!("Event stream error: {} [request_id: {}]", e, request_id),
                        });
                        break;
                    }
                }
            }
        };

        Ok(EventStreamResponse {
            headers,
            events: stream.boxed(),
        })
    }
}

/// Await `fut` unless the abort signal fires first
async fn with_abort<T, F>(abort: Option<&CancellationToken>, fut: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match abort {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(ProviderError::Cancelled),
            result = fut => result,
        },
        None => fut.await,
    }
}

/// Flatten response headers into a lowercase-keyed map
fn response_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
