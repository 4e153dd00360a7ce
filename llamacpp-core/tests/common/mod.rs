//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use llamacpp_core::http::{EventStreamResponse, HttpExecutor, JsonResponse, PostRequest};
use llamacpp_core::{LlamacppProvider, LlamacppProviderSettings, ProviderError, ProviderResult};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// What the spy answers with, in call order
pub enum Scripted {
    Json(Value),
    Events(Vec<ProviderResult<String>>),
    Fail(ProviderError),
}

/// Executor that records every request and replays scripted answers
#[derive(Default)]
pub struct SpyExecutor {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<PostRequest>>,
}

impl SpyExecutor {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<PostRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next(&self, request: PostRequest) -> Scripted {
        self.calls.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("spy executor ran out of scripted responses")
    }
}

fn response_headers() -> HashMap<String, String> {
    HashMap::from([("x-spy".to_string(), "1".to_string())])
}

#[async_trait]
impl HttpExecutor for SpyExecutor {
    async fn post_json(&self, request: PostRequest) -> ProviderResult<JsonResponse> {
        match self.next(request) {
            Scripted::Json(body) => Ok(JsonResponse {
                headers: response_headers(),
                body,
            }),
            Scripted::Fail(error) => Err(error),
            Scripted::Events(_) => panic!("scripted events for a JSON call"),
        }
    }

    async fn post_event_stream(&self, request: PostRequest) -> ProviderResult<EventStreamResponse> {
        match self.next(request) {
            Scripted::Events(events) => Ok(EventStreamResponse {
                headers: response_headers(),
                events: futures::stream::iter(events).boxed(),
            }),
            Scripted::Fail(error) => Err(error),
            Scripted::Json(_) => panic!("scripted JSON for a streaming call"),
        }
    }
}

/// Route crate logs to the test harness, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Provider wired to a spy
pub fn spy_provider(script: Vec<Scripted>) -> (LlamacppProvider, Arc<SpyExecutor>) {
    spy_provider_with(LlamacppProviderSettings::default(), script)
}

pub fn spy_provider_with(
    settings: LlamacppProviderSettings,
    script: Vec<Scripted>,
) -> (LlamacppProvider, Arc<SpyExecutor>) {
    init_tracing();
    let spy = SpyExecutor::new(script);
    let provider = LlamacppProvider::with_executor(settings, spy.clone());
    (provider, spy)
}

/// Wrap a JSON payload as one event-stream item
pub fn event(payload: Value) -> ProviderResult<String> {
    Ok(payload.to_string())
}
