//! HTTP client and end-to-end tests against a mock llama.cpp server

use futures::StreamExt;
use llamacpp_core::http::{HttpClient, HttpExecutor, PostRequest};
use llamacpp_core::{
    create_llamacpp, CallOptions, EmbedOptions, EmbeddingModel, FinishReasonKind, LanguageModel,
    LlamacppProviderSettings, Message, ProviderError, StreamEvent,
};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(payloads: &[serde_json::Value]) -> String {
    payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect()
}

#[tokio::test]
async fn test_post_json_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/completion"))
        .and(header_exists("X-Request-ID"))
        .and(body_partial_json(json!({ "prompt": "hi" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-slot", "0")
                .set_body_json(json!({ "content": "hello" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = PostRequest::new(
        format!("{}/completion", mock_server.uri()),
        json!({ "prompt": "hi" }),
    );

    let response = client.post_json(request).await.unwrap();
    assert_eq!(response.body, json!({ "content": "hello" }));
    assert_eq!(response.headers.get("x-slot").map(String::as_str), Some("0"));
}

#[tokio::test]
async fn test_error_envelope_is_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/completion"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "the request exceeds the available context size",
                "type": "exceed_context_size_error"
            }
        })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = PostRequest::new(format!("{}/completion", mock_server.uri()), json!({}));

    match client.post_json(request).await {
        Err(ProviderError::Api {
            status,
            message,
            code,
            error_type,
            retryable,
            ..
        }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "the request exceeds the available context size");
            assert_eq!(code.as_deref(), Some("400"));
            assert_eq!(error_type.as_deref(), Some("exceed_context_size_error"));
            assert!(!retryable);
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = PostRequest::new(format!("{}/completion", mock_server.uri()), json!({}));

    match client.post_json(request).await {
        Err(ProviderError::Http { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body.as_deref(), Some("Bad Gateway"));
        }
        other => panic!("Expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_content_type_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html></html>"),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = PostRequest::new(format!("{}/completion", mock_server.uri()), json!({}));

    let err = client.post_json(request).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "content": "late" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client =
        HttpClient::with_config(Duration::from_secs(1), Duration::from_millis(50), 1).unwrap();
    let request = PostRequest::new(format!("{}/completion", mock_server.uri()), json!({}));

    let err = client.post_json(request).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout));
}

#[tokio::test]
async fn test_abort_before_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "content": "late" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let token = CancellationToken::new();
    let request = PostRequest::new(format!("{}/completion", mock_server.uri()), json!({}))
        .with_abort(Some(token.clone()));

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = client.post_json(request).await.unwrap_err();
    assert!(matches!(err, ProviderError::Cancelled));
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_event_stream_payloads() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/completion"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse(&[json!({ "content": "a" }), json!({ "content": "b" })])),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = PostRequest::new(
        format!("{}/completion", mock_server.uri()),
        json!({ "stream": true }),
    );

    let response = client.post_event_stream(request).await.unwrap();
    let payloads: Vec<String> = response
        .events
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(payloads, vec![r#"{"content":"a"}"#, r#"{"content":"b"}"#]);
}

#[tokio::test]
async fn test_event_stream_handshake_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "Loading model", "type": "unavailable_error" }
        })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = PostRequest::new(format!("{}/completion", mock_server.uri()), json!({}));

    let err = client.post_event_stream(request).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { status: 503, retryable: true, .. }));
}

#[tokio::test]
async fn test_end_to_end_generate_with_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/completion"))
        .and(header("Authorization", "Bearer local-secret-key"))
        .and(body_partial_json(json!({ "prompt": "Hi", "n_predict": 8 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": "Hello!",
            "stop_type": "word",
            "tokens_evaluated": 3,
            "tokens_predicted": 2
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = create_llamacpp(
        LlamacppProviderSettings::default()
            .with_base_url(format!("{}/", mock_server.uri()))
            .with_api_key("local-secret-key"),
    )
    .unwrap();

    let result = provider
        .chat("local")
        .do_generate(CallOptions::new(vec![Message::user("Hi")]).with_max_output_tokens(8))
        .await
        .unwrap();

    assert_eq!(result.text(), "Hello!");
    assert_eq!(result.finish_reason.unified, FinishReasonKind::Stop);
    assert_eq!(result.usage.total_tokens(), Some(5));
}

#[tokio::test]
async fn test_end_to_end_stream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/completion"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse(&[
                    json!({ "content": "Hel" }),
                    json!({ "content": "lo" }),
                    json!({
                        "content": "",
                        "stop_type": "eos",
                        "tokens_evaluated": 3,
                        "tokens_predicted": 2,
                        "timings": { "predicted_n": 2 }
                    }),
                ])),
        )
        .mount(&mock_server)
        .await;

    let provider =
        create_llamacpp(LlamacppProviderSettings::default().with_base_url(mock_server.uri()))
            .unwrap();

    let result = provider
        .chat("local")
        .do_stream(CallOptions::new(vec![Message::user("Hi")]))
        .await
        .unwrap();

    let events: Vec<StreamEvent> = result.stream.collect().await;
    let kinds: Vec<_> = events.iter().map(StreamEvent::kind).collect();
    assert_eq!(
        kinds,
        vec!["stream-start", "text-delta", "text-delta", "text-end", "finish"]
    );

    match events.last() {
        Some(StreamEvent::Finish {
            finish_reason,
            usage,
        }) => {
            assert_eq!(finish_reason.unified, FinishReasonKind::Stop);
            assert_eq!(usage.total_tokens(), Some(5));
        }
        other => panic!("Expected finish, got {:?}", other),
    }
}

#[tokio::test]
async fn test_end_to_end_embed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({ "encoding_format": "float" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": [0.5, -0.5] }],
            "usage": { "prompt_tokens": 2 }
        })))
        .mount(&mock_server)
        .await;

    let provider =
        create_llamacpp(LlamacppProviderSettings::default().with_base_url(mock_server.uri()))
            .unwrap();

    let result = provider
        .embedding("embed")
        .do_embed(EmbedOptions::new(["hi"]))
        .await
        .unwrap();

    assert_eq!(result.embeddings, vec![vec![0.5_f32, -0.5]]);
    assert_eq!(result.usage.map(|u| u.tokens), Some(2));
}

#[test]
fn test_invalid_base_url_rejected() {
    let err = create_llamacpp(LlamacppProviderSettings::default().with_base_url("not a url"))
        .unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(_)));
}
