//! Typed llama.cpp option records
//!
//! Callers pass backend options under `provider_options["llamacpp"]` as
//! camelCase JSON. Each record deserializes from that shape and serializes
//! to the server's snake_case wire names, so the record itself is the
//! translation table: a new sampling parameter is one more field.

use crate::config::{ValidationError, ValidationErrorKind};
use crate::protocol::ProviderOptions;
use serde::de::{self, DeserializeOwned, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key of the llama.cpp entry in a provider option bag
pub const PROVIDER_OPTIONS_KEY: &str = "llamacpp";

const FIELD_PREFIX: &str = "providerOptions.llamacpp";

/// Backend options for `/completion`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "camelCase", serialize = "snake_case"))]
pub struct LlamacppLanguageModelOptions {
    // basic sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    // sampling and decoding
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_predict: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynatemp_range: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynatemp_exponent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n_sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xtc_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xtc_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_p: Option<f64>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_last_n: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_base: Option<f64>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_allowed_length: Option<i64>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_penalty_last_n: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_sequence_breakers: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat_tau: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirostat_eta: Option<f64>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_keep: Option<i64>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_probs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samplers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_sampling_probs: Option<bool>,

    // control and constraints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar: Option<String>,
    /// Any JSON schema; passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<LogitBias>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_eos: Option<bool>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_max_predict_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_keep: Option<i64>,
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_indent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,

    // execution and caching
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_slot: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_prompt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_tokens: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings_per_token: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_progress: Option<bool>,

    // LoRA and advanced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lora: Option<Vec<LoraAdapter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_fields: Option<Vec<String>>,

    /// Arbitrary fields merged into the request body after everything else
    #[serde(skip_serializing)]
    pub extra_params: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
}

/// A LoRA adapter selection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoraAdapter {
    #[serde(deserialize_with = "integer")]
    pub id: i64,
    pub scale: f64,
}

/// Token bias, either keyed by token text or as `[token, bias]` pairs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LogitBias {
    Map(BTreeMap<String, BiasValue>),
    Pairs(Vec<(TokenRef, BiasValue)>),
}

/// A bias weight, or `false` to ban a token outright
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BiasValue {
    Weight(f64),
    Flag(bool),
}

/// A token addressed by id or by text
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TokenRef {
    Id(i64),
    Text(String),
}

impl LlamacppLanguageModelOptions {
    /// Semantic checks the type system cannot express
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(mode) = self.mirostat {
            if !(0..=2).contains(&mode) {
                return Err(ValidationError::invalid_value(
                    field_path("mirostat"),
                    "0, 1 or 2",
                    mode.to_string(),
                ));
            }
        }

        if let Some(n_predict) = self.n_predict {
            if n_predict < -1 {
                return Err(ValidationError::out_of_range(
                    field_path("nPredict"),
                    "Must be -1 (unbounded) or a non-negative count",
                ));
            }
        }

        let probabilities = [
            ("topP", self.top_p),
            ("minP", self.min_p),
            ("typicalP", self.typical_p),
            ("xtcProbability", self.xtc_probability),
        ];
        for (name, value) in probabilities {
            if let Some(p) = value {
                if !(0.0..=1.0).contains(&p) {
                    return Err(ValidationError::out_of_range(
                        field_path(name),
                        format!("Must be between 0 and 1, got {}", p),
                    ));
                }
            }
        }

        if let Some(adapters) = &self.lora {
            for (index, adapter) in adapters.iter().enumerate() {
                if !adapter.scale.is_finite() {
                    return Err(ValidationError::out_of_range(
                        field_path(&format!("lora[{}].scale", index)),
                        "Must be a finite number",
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Backend options for `/embeddings`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all(deserialize = "camelCase", serialize = "snake_case"))]
pub struct LlamacppEmbeddingOptions {
    /// Normalization mode: -1 none, 0 max-abs, 1 taxicab, 2 euclidean, >2 p-norm
    #[serde(default, deserialize_with = "optional_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embd_normalize: Option<i64>,
}

/// Read and schema-check the `llamacpp` entry of a provider option bag.
///
/// A missing or `null` entry yields `None`. Unknown keys are ignored.
pub fn parse_provider_options<T: DeserializeOwned>(
    provider_options: &ProviderOptions,
) -> Result<Option<T>, ValidationError> {
    let value = match provider_options.get(PROVIDER_OPTIONS_KEY) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };

    if !value.is_object() {
        return Err(ValidationError::invalid_value(
            FIELD_PREFIX,
            "an object",
            json_type_name(value),
        ));
    }

    serde_path_to_error::deserialize(value.clone())
        .map(Some)
        .map_err(|err| {
            let path = err.path().to_string();
            let field = if path == "." {
                FIELD_PREFIX.to_string()
            } else {
                field_path(&path)
            };
            ValidationError::new(
                field,
                ValidationErrorKind::InvalidFormat {
                    message: err.into_inner().to_string(),
                },
            )
        })
}

/// A whole number, written either as `42` or as `42.0`
struct Integral(i64);

impl<'de> Deserialize<'de> for Integral {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let number = serde_json::Number::deserialize(deserializer)?;
        if let Some(n) = number.as_i64() {
            return Ok(Integral(n));
        }
        match number.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Ok(Integral(f as i64))
            }
            Some(f) => Err(de::Error::invalid_value(Unexpected::Float(f), &"an integer")),
            None => Err(de::Error::custom(format!("{} is out of range for an integer", number))),
        }
    }
}

fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Integral::deserialize(deserializer).map(|n| n.0)
}

fn optional_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Option::<Integral>::deserialize(deserializer).map(|n| n.map(|n| n.0))
}

fn field_path(name: &str) -> String {
    format!("{}.{}", FIELD_PREFIX, name)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
