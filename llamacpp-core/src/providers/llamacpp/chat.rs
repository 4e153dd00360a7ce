//! llama.cpp chat model

use super::converter::from_completion_response;
use super::provider::ModelConfig;
use super::request::{resolve_call_options, ResolvedCall};
use super::streaming::normalize_stream;
use crate::http::PostRequest;
use crate::protocol::{
    CallOptions, GenerateResult, RequestMetadata, ResolvedRequest, ResponseMetadata, StreamResult,
};
use crate::providers::adapter::LanguageModel;
use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use tracing::info;

const COMPLETION_PATH: &str = "/completion";

/// Chat model backed by llama.cpp `/completion`
#[derive(Clone)]
pub struct LlamacppChatModel {
    model_id: String,
    config: ModelConfig,
}

impl std::fmt::Debug for LlamacppChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlamacppChatModel")
            .field("model_id", &self.model_id)
            .field("provider", &self.config.provider)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl LlamacppChatModel {
    pub(crate) fn new(model_id: String, config: ModelConfig) -> Self {
        Self { model_id, config }
    }

    fn post_request(&self, body: &ResolvedRequest, options: &CallOptions) -> PostRequest {
        PostRequest::new(self.config.url(COMPLETION_PATH), body.to_value())
            .with_headers(self.config.headers(&options.headers))
            .with_abort(options.abort_signal.clone())
    }
}

#[async_trait]
impl LanguageModel for LlamacppChatModel {
    fn provider(&self) -> &str {
        self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, options: CallOptions) -> ProviderResult<GenerateResult> {
        let ResolvedCall { body, warnings } = resolve_call_options(&options)?;
        let request = self.post_request(&body, &options);

        info!(
            model = %self.model_id,
            request_id = %request.request_id,
            "Generating completion"
        );

        let response = self.config.executor.post_json(request).await?;
        from_completion_response(response, body, warnings)
    }

    async fn do_stream(&self, options: CallOptions) -> ProviderResult<StreamResult> {
        let ResolvedCall { body, warnings } = resolve_call_options(&options)?.into_streaming();
        let request = self.post_request(&body, &options);

        info!(
            model = %self.model_id,
            request_id = %request.request_id,
            "Streaming completion"
        );

        let response = self.config.executor.post_event_stream(request).await?;

        Ok(StreamResult {
            stream: normalize_stream(response.events, warnings, options.abort_signal),
            request: RequestMetadata { body },
            response: ResponseMetadata {
                headers: response.headers,
                body: None,
            },
        })
    }
}
