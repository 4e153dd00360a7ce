//! Environment variable interpolation for configuration

use super::error::ConfigError;
use super::schema::LlamacppConfig;
use super::secrets::SecretString;
use regex::Regex;
use std::env;
use std::sync::LazyLock;

/// Environment variable holding the llama.cpp API key
pub const API_KEY_ENV_VAR: &str = "LLAMACPP_API_KEY";

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
});

/// Interpolate environment variables in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for cap in ENV_VAR_PATTERN.captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        match env::var(var_name) {
            Ok(value) => {
                result = result.replace(full_match, &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    // Report the first missing variable
    if let Some(var) = missing_vars.first() {
        return Err(ConfigError::MissingEnvVar { var: var.clone() });
    }

    Ok(result)
}

/// Interpolate environment variables left in sensitive fields after parsing
pub fn interpolate_config_env_vars(config: &mut LlamacppConfig) -> Result<(), ConfigError> {
    if let Some(api_key) = &config.provider.api_key {
        let api_key_str = api_key.expose_secret();
        if ENV_VAR_PATTERN.is_match(api_key_str) {
            let interpolated = interpolate_single_value(api_key_str)?;
            config.provider.api_key = Some(SecretString::new(interpolated));
        }
    }

    if ENV_VAR_PATTERN.is_match(&config.provider.base_url) {
        config.provider.base_url = interpolate_single_value(&config.provider.base_url)?;
    }

    Ok(())
}

/// Interpolate a single value that may contain environment variables
fn interpolate_single_value(value: &str) -> Result<String, ConfigError> {
    if let Some(cap) = ENV_VAR_PATTERN.captures(value) {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(env_value) => Ok(value.replace(&cap[0], &env_value)),
            Err(_) => Err(ConfigError::MissingEnvVar {
                var: var_name.to_string(),
            }),
        }
    } else {
        Ok(value.to_string())
    }
}

/// Extract environment variable names referenced by `${VAR}` placeholders
pub fn extract_env_vars(text: &str) -> Vec<String> {
    ENV_VAR_PATTERN
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Resolve the API key: an explicit value wins, then `LLAMACPP_API_KEY`.
///
/// Returns `None` when neither is set; the key is optional for llama.cpp.
pub fn load_api_key(explicit: Option<&SecretString>) -> Option<SecretString> {
    if let Some(key) = explicit {
        if !key.is_empty() {
            return Some(key.clone());
        }
    }

    env::var(API_KEY_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        env::set_var("LLAMACPP_TEST_VAR", "test_value");

        let content = "api_key: ${LLAMACPP_TEST_VAR}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "api_key: test_value");

        env::remove_var("LLAMACPP_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let content = "api_key: ${LLAMACPP_MISSING_VAR}";
        let result = interpolate_env_vars(content);

        if let Err(ConfigError::MissingEnvVar { var }) = result {
            assert_eq!(var, "LLAMACPP_MISSING_VAR");
        } else {
            panic!("Expected MissingEnvVar error");
        }
    }

    #[test]
    fn test_extract_env_vars() {
        let vars = extract_env_vars("api_key: ${LLAMACPP_API_KEY}, url: ${LLAMACPP_URL}");
        assert_eq!(vars, vec!["LLAMACPP_API_KEY", "LLAMACPP_URL"]);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let explicit = SecretString::new("explicit-key");
        let resolved = load_api_key(Some(&explicit)).unwrap();
        assert_eq!(resolved.expose_secret(), "explicit-key");
    }
}
