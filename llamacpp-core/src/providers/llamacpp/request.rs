//! Option resolution: generic call options plus llama.cpp options into one request body
//!
//! Precedence per wire field, highest first:
//! 1. `extraParams` entries, merged last
//! 2. named llama.cpp options
//! 3. generic call options
//! 4. hard-coded defaults (`n_predict = -1`)

use super::options::{parse_provider_options, LlamacppLanguageModelOptions};
use crate::protocol::{CallOptions, CallWarning, Message, ResolvedRequest};
use crate::providers::error::ProviderResult;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// `n_predict` value meaning "generate until a stop condition"
pub const UNBOUNDED_N_PREDICT: i64 = -1;

/// A resolved call: the body to send and the warnings to report
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    pub body: ResolvedRequest,
    pub warnings: Vec<CallWarning>,
}

impl ResolvedCall {
    /// The same call in event-stream mode
    pub fn into_streaming(self) -> Self {
        Self {
            body: self.body.with_field("stream", Value::Bool(true)),
            warnings: self.warnings,
        }
    }
}

/// Resolve call options into a `/completion` request body.
///
/// Fails only when the llama.cpp option bag breaks its schema; unsupported
/// generic settings become warnings.
pub fn resolve_call_options(options: &CallOptions) -> ProviderResult<ResolvedCall> {
    let backend: LlamacppLanguageModelOptions =
        parse_provider_options(&options.provider_options)?.unwrap_or_default();
    backend.validate()?;

    let mut warnings = Vec::new();
    if options.tools.is_some() || options.tool_choice.is_some() {
        warn!("llama.cpp completion does not support tools; ignoring them");
        warnings.push(CallWarning::unsupported_setting("tools"));
    }

    let mut fields = generic_fields(options);

    // Named backend options override the generic ones
    if let Value::Object(named) = serde_json::to_value(&backend)? {
        fields.extend(named);
    }

    if let Some(extra) = backend.extra_params {
        fields.extend(extra);
    }

    debug!(
        keys = ?fields.keys().collect::<Vec<_>>(),
        warnings = warnings.len(),
        "Resolved llama.cpp request"
    );

    Ok(ResolvedCall {
        body: ResolvedRequest::from_map(fields),
        warnings,
    })
}

/// Flatten prompt turns into one text blob.
///
/// Each turn contributes its text parts concatenated; turns are joined by a
/// newline. Non-text parts are dropped.
pub fn flatten_prompt(prompt: &[Message]) -> String {
    prompt
        .iter()
        .map(|message| message.content.text_parts_joined())
        .collect::<Vec<_>>()
        .join("\n")
}

fn generic_fields(options: &CallOptions) -> Map<String, Value> {
    let mut fields = Map::new();

    fields.insert("prompt".into(), Value::String(flatten_prompt(&options.prompt)));
    fields.insert(
        "n_predict".into(),
        Value::from(
            options
                .max_output_tokens
                .map(i64::from)
                .unwrap_or(UNBOUNDED_N_PREDICT),
        ),
    );

    insert_opt(&mut fields, "temperature", options.temperature);
    insert_opt(&mut fields, "top_p", options.top_p);
    insert_opt(&mut fields, "top_k", options.top_k);
    insert_opt(&mut fields, "stop", options.stop_sequences.clone());
    insert_opt(&mut fields, "seed", options.seed);
    insert_opt(&mut fields, "presence_penalty", options.presence_penalty);
    insert_opt(&mut fields, "frequency_penalty", options.frequency_penalty);

    fields
}

fn insert_opt<T: Into<Value>>(fields: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value.into());
    }
}
