//! Configuration module
//!
//! This module provides the configuration schema, loading, and validation
//! for talking to a llama.cpp server.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{extract_env_vars, load_api_key, API_KEY_ENV_VAR};
pub use error::{ConfigError, ConfigFormat, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ConnectionConfig, EmbeddingConfig, LlamacppConfig, ProviderConfig, CONFIG_VERSION,
    DEFAULT_BASE_URL,
};
pub use secrets::{is_sensitive_header, redact_header, SecretString};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<LlamacppConfig> {
    load(path.as_ref(), ConfigFormat::Yaml)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<LlamacppConfig> {
    load(path.as_ref(), ConfigFormat::Json)
}

/// Load a configuration, picking the format from the file extension
pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<LlamacppConfig> {
    let path = path.as_ref();
    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => ConfigFormat::Yaml,
        Some("json") => ConfigFormat::Json,
        _ => {
            return Err(ConfigError::UnknownFormat {
                path: path.to_path_buf(),
            })
        }
    };
    load(path, format)
}

fn load(path: &Path, format: ConfigFormat) -> ConfigResult<LlamacppConfig> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    let parse_error = |line, column, message| ConfigError::Parse {
        path: path.to_path_buf(),
        format,
        line,
        column,
        message,
    };

    let mut config: LlamacppConfig = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&interpolated).map_err(|e| {
            let location = e.location();
            parse_error(
                location.as_ref().map(|l| l.line()),
                location.as_ref().map(|l| l.column()),
                e.to_string(),
            )
        })?,
        ConfigFormat::Json => serde_json::from_str(&interpolated)
            .map_err(|e| parse_error(Some(e.line()), Some(e.column()), e.to_string()))?,
    };

    env::interpolate_config_env_vars(&mut config)?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}
