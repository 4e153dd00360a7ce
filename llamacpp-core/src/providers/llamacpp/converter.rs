//! Conversion of one-shot llama.cpp responses into unified results

use super::finish_reason::map_finish_reason;
use super::types::CompletionResponse;
use crate::http::JsonResponse;
use crate::protocol::{
    CallWarning, Content, GenerateResult, RequestMetadata, ResolvedRequest, ResponseMetadata,
    Usage,
};
use crate::providers::error::{ProviderError, ProviderResult};

/// Normalize a `/completion` JSON response
pub fn from_completion_response(
    response: JsonResponse,
    request: ResolvedRequest,
    warnings: Vec<CallWarning>,
) -> ProviderResult<GenerateResult> {
    let completion: CompletionResponse =
        serde_json::from_value(response.body.clone()).map_err(|e| {
            ProviderError::InvalidResponse {
                message: format!("Unexpected completion response: {}", e),
            }
        })?;

    let mut content = Vec::new();
    if !completion.content.is_empty() {
        content.push(Content::Text {
            text: completion.content,
        });
    }

    Ok(GenerateResult {
        content,
        finish_reason: map_finish_reason(completion.stop_type.as_deref().filter(|t| !t.is_empty())),
        usage: Usage::from_counts(completion.tokens_evaluated, completion.tokens_predicted),
        warnings,
        request: RequestMetadata { body: request },
        response: ResponseMetadata {
            headers: response.headers,
            body: Some(response.body),
        },
    })
}
