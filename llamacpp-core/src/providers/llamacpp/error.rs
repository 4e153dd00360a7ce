//! llama.cpp error envelope handling

use super::types::ErrorResponse;
use crate::providers::error::{is_retryable_status, ProviderError};
use serde_json::Value;

/// Turn a non-success response into a typed error.
///
/// A body matching `{ "error": { "code", "message", "type" } }` becomes
/// [`ProviderError::Api`]; anything else falls back to [`ProviderError::Http`].
pub fn normalize_error_response(status: u16, body: Option<String>) -> ProviderError {
    let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
        return ProviderError::Http { status, body: None };
    };

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(envelope) => ProviderError::Api {
            status,
            message: envelope.error.message,
            code: envelope.error.code.and_then(code_to_string),
            error_type: envelope.error.error_type,
            body,
            retryable: is_retryable_status(status),
        },
        Err(_) => ProviderError::Http {
            status,
            body: Some(body),
        },
    }
}

fn code_to_string(code: Value) -> Option<String> {
    match code {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
