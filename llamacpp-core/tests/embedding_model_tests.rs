//! Embedding model tests against a recording executor

mod common;

use common::{spy_provider, spy_provider_with, Scripted};
use llamacpp_core::{EmbedOptions, EmbeddingModel, LlamacppProviderSettings, ProviderError};
use serde_json::json;

#[tokio::test]
async fn test_embed_request_and_response() {
    let (provider, spy) = spy_provider(vec![Scripted::Json(json!({
        "data": [
            { "embedding": [0.1, 0.2] },
            { "embedding": [0.3, 0.4] }
        ],
        "usage": { "prompt_tokens": 6 }
    }))]);
    let model = provider.embedding("nomic-embed");

    let result = model
        .do_embed(
            EmbedOptions::new(["sunny day", "rainy day"])
                .with_provider_options("llamacpp", json!({ "embdNormalize": 2 })),
        )
        .await
        .unwrap();

    let call = &spy.calls()[0];
    assert_eq!(call.url, "http://127.0.0.1:8080/embeddings");
    assert_eq!(
        call.body,
        json!({
            "model": "nomic-embed",
            "input": ["sunny day", "rainy day"],
            "encoding_format": "float",
            "embd_normalize": 2
        })
    );

    assert_eq!(result.embeddings, vec![vec![0.1_f32, 0.2], vec![0.3, 0.4]]);
    assert_eq!(result.usage.map(|u| u.tokens), Some(6));
    assert!(result.warnings.is_empty());
    assert!(result.response.body.is_some());
}

#[tokio::test]
async fn test_embed_without_usage_or_options() {
    let (provider, spy) = spy_provider(vec![Scripted::Json(json!({
        "data": [{ "embedding": [1.0] }],
        "usage": null
    }))]);
    let model = provider.text_embedding("nomic-embed");

    let result = model.do_embed(EmbedOptions::new(["x"])).await.unwrap();
    assert!(result.usage.is_none());
    assert!(spy.calls()[0].body.get("embd_normalize").is_none());
}

#[tokio::test]
async fn test_embedding_aliases_share_settings() {
    let settings = LlamacppProviderSettings::default().with_max_embeddings_per_call(4);
    let (provider, spy) = spy_provider_with(
        settings,
        vec![Scripted::Json(json!({ "data": [{ "embedding": [0.25] }] }))],
    );

    for model in [
        provider.embedding("e5"),
        provider.text_embedding("e5"),
        provider.text_embedding_model("e5"),
    ] {
        assert_eq!(model.provider(), "llamacpp.embedding");
        assert_eq!(model.model_id(), "e5");
        assert_eq!(model.max_embeddings_per_call(), 4);
    }

    let result = provider
        .text_embedding_model("e5")
        .do_embed(EmbedOptions::new(["x"]))
        .await
        .unwrap();
    assert_eq!(result.embeddings, vec![vec![0.25_f32]]);
    assert_eq!(spy.calls()[0].url, "http://127.0.0.1:8080/embeddings");
}

#[tokio::test]
async fn test_too_many_values_fails_before_transport() {
    let (provider, spy) = spy_provider(vec![]);
    let model = provider.embedding("nomic-embed");
    assert_eq!(model.max_embeddings_per_call(), 32);
    assert!(!model.supports_parallel_calls());
    assert_eq!(model.provider(), "llamacpp.embedding");

    let values: Vec<String> = (0..33).map(|i| format!("value {}", i)).collect();

    // An invalid option bag must not mask the batch limit
    let options = EmbedOptions::new(values)
        .with_provider_options("llamacpp", json!({ "embdNormalize": "bad" }));

    match model.do_embed(options).await {
        Err(ProviderError::TooManyValues {
            provider,
            model_id,
            max_embeddings_per_call,
            values,
        }) => {
            assert_eq!(provider, "llamacpp.embedding");
            assert_eq!(model_id, "nomic-embed");
            assert_eq!(max_embeddings_per_call, 32);
            assert_eq!(values, 33);
        }
        other => panic!("Expected TooManyValues, got {:?}", other),
    }

    assert_eq!(spy.call_count(), 0);
}

#[tokio::test]
async fn test_configured_batch_limit() {
    let settings = LlamacppProviderSettings::default().with_max_embeddings_per_call(2);
    let (provider, spy) = spy_provider_with(settings, vec![]);
    let model = provider.embedding("nomic-embed");

    let err = model
        .do_embed(EmbedOptions::new(["a", "b", "c"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::TooManyValues { values: 3, .. }));
    assert_eq!(spy.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_embedding_options() {
    let (provider, spy) = spy_provider(vec![]);
    let model = provider.embedding("nomic-embed");

    let err = model
        .do_embed(
            EmbedOptions::new(["a"])
                .with_provider_options("llamacpp", json!({ "embdNormalize": 0.5 })),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::SchemaValidation(_)));
    assert_eq!(spy.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_embedding_response() {
    let (provider, _spy) = spy_provider(vec![Scripted::Json(json!({ "embeddings": [] }))]);
    let model = provider.embedding("nomic-embed");

    let err = model.do_embed(EmbedOptions::new(["a"])).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
}
