//! HTTP error mapping utilities

use crate::providers::error::ProviderError;
use crate::providers::llamacpp::error::normalize_error_response;
use reqwest::StatusCode;
use tracing::debug;
use uuid::Uuid;

/// Map a non-success HTTP status and response body to a ProviderError
pub fn map_http_error(status: StatusCode, body: Option<String>, request_id: Uuid) -> ProviderError {
    let error = normalize_error_response(status.as_u16(), body);
    debug!("Mapped HTTP {} to {:?} [request_id: {}]", status.as_u16(), error, request_id);
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_envelope_to_api_error() {
        let body = r#"{"error":{"code":400,"message":"bad prompt","type":"invalid_request_error"}}"#;
        let err = map_http_error(StatusCode::BAD_REQUEST, Some(body.to_string()), Uuid::new_v4());

        match err {
            ProviderError::Api { status, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad prompt");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_body_maps_to_http_error() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, None, Uuid::new_v4());
        assert!(matches!(err, ProviderError::Http { status: 502, body: None }));
    }
}
