//! API key resolution from the environment.
//!
//! Kept in its own test binary: it mutates `LLAMACPP_API_KEY`.

mod common;

use common::{spy_provider, spy_provider_with, Scripted};
use llamacpp_core::config::API_KEY_ENV_VAR;
use llamacpp_core::{CallOptions, LanguageModel, LlamacppProviderSettings, Message};
use serde_json::json;
use std::env;

fn ok_body() -> serde_json::Value {
    json!({ "content": "ok" })
}

#[tokio::test]
async fn test_api_key_resolution_order() {
    // No key anywhere: no Authorization header
    env::remove_var(API_KEY_ENV_VAR);
    let (provider, spy) = spy_provider(vec![Scripted::Json(ok_body())]);
    provider
        .chat("m")
        .do_generate(CallOptions::new(vec![Message::user("hi")]))
        .await
        .unwrap();
    assert!(!spy.calls()[0]
        .headers
        .keys()
        .any(|k| k.eq_ignore_ascii_case("authorization")));

    // Environment key, read at call time
    let (provider, spy) = spy_provider(vec![Scripted::Json(ok_body())]);
    env::set_var(API_KEY_ENV_VAR, "env-key");
    provider
        .chat("m")
        .do_generate(CallOptions::new(vec![Message::user("hi")]))
        .await
        .unwrap();
    assert_eq!(
        spy.calls()[0].headers.get("Authorization").map(String::as_str),
        Some("Bearer env-key")
    );

    // Explicit key beats the environment
    let (provider, spy) = spy_provider_with(
        LlamacppProviderSettings::default().with_api_key("explicit-key"),
        vec![Scripted::Json(ok_body())],
    );
    provider
        .chat("m")
        .do_generate(CallOptions::new(vec![Message::user("hi")]))
        .await
        .unwrap();
    assert_eq!(
        spy.calls()[0].headers.get("Authorization").map(String::as_str),
        Some("Bearer explicit-key")
    );

    env::remove_var(API_KEY_ENV_VAR);
}
