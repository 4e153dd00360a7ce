//! Streaming support for llama.cpp `/completion`
//!
//! Raw event payloads are parsed one by one and folded into unified
//! [`StreamEvent`]s. The only state is a running usage and finish-reason
//! accumulator owned by the single task driving the stream.

use super::finish_reason::map_finish_reason;
use super::types::CompletionChunk;
use crate::protocol::{CallWarning, EventStream, FinishReason, StreamEvent, Usage};
use crate::providers::error::{ProviderError, ProviderResult};
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Id of the single text block a stream carries
pub const TEXT_BLOCK_ID: &str = "0";

/// Parse the `data` payload of one server-sent event
pub fn parse_chunk(data: &str) -> ProviderResult<CompletionChunk> {
    serde_json::from_str(data).map_err(|e| ProviderError::ChunkParse {
        message: e.to_string(),
        raw: data.to_string(),
    })
}

/// Accumulator for one streaming call
#[derive(Debug, Default)]
pub struct StreamState {
    finish_reason: FinishReason,
    usage: Usage,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk in, returning the event it produces, if any.
    ///
    /// A failed chunk becomes an `Error` event and leaves the state untouched.
    pub fn process(&mut self, chunk: ProviderResult<CompletionChunk>) -> Option<StreamEvent> {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(error) => {
                if let ProviderError::ChunkParse { message, raw } = &error {
                    warn!(raw = %truncate(raw), "Skipping malformed stream chunk: {}", message);
                }
                return Some(StreamEvent::Error { error });
            }
        };

        // Counts are cumulative, so the latest report wins
        if chunk.timings.is_some() {
            self.usage = Usage::from_counts(chunk.tokens_evaluated, chunk.tokens_predicted);
        }

        // An empty tag carries no information and must not clobber a known one
        if let Some(stop_type) = chunk.stop_type.as_deref().filter(|t| !t.is_empty()) {
            self.finish_reason = map_finish_reason(Some(stop_type));
        }

        match chunk.content {
            Some(delta) if !delta.is_empty() => Some(StreamEvent::TextDelta {
                id: TEXT_BLOCK_ID.to_string(),
                delta,
            }),
            _ => None,
        }
    }

    /// Closing events: the text block end, then the finish
    pub fn finish(self) -> [StreamEvent; 2] {
        [
            StreamEvent::TextEnd {
                id: TEXT_BLOCK_ID.to_string(),
            },
            StreamEvent::Finish {
                finish_reason: self.finish_reason,
                usage: self.usage,
            },
        ]
    }
}

/// Turn raw event payloads into unified stream events.
///
/// `StreamStart` is emitted before the first payload is awaited. If the
/// abort signal fires, one `Error(Cancelled)` event is emitted and the
/// stream ends without `TextEnd` or `Finish`.
pub fn normalize_stream(
    events: BoxStream<'static, ProviderResult<String>>,
    warnings: Vec<CallWarning>,
    abort: Option<CancellationToken>,
) -> EventStream {
    Box::pin(async_stream::stream! {
        yield StreamEvent::StreamStart { warnings };

        let mut events = events;
        let mut state = StreamState::new();

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

            let chunk = match next {
                None | Some(Some(Err(ProviderError::Cancelled))) => {
                    debug!("Stream aborted by caller");
                    yield StreamEvent::Error { error: ProviderError::Cancelled };
                    return;
                }
                Some(None) => break,
                Some(Some(Ok(data))) => parse_chunk(&data),
                Some(Some(Err(error))) => Err(error),
            };

            if let Some(event) = state.process(chunk) {
                yield event;
            }
        }

        for event in state.finish() {
            yield event;
        }
    })
}

fn truncate(raw: &str) -> &str {
    match raw.char_indices().nth(200) {
        Some((index, _)) => &raw[..index],
        None => raw,
    }
}
