//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::LlamacppConfig;
use tracing::warn;

/// Configuration validator with rules that span several sections
#[derive(Debug, Default)]
pub struct ConfigValidator {
    _private: (),
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &LlamacppConfig) -> Result<(), ValidationError> {
        // First run the built-in validation
        config.validate()?;

        self.validate_credential_sources(config)?;
        self.check_cleartext_credentials(config);

        Ok(())
    }

    /// An API key and a hand-written Authorization header cannot both be set
    fn validate_credential_sources(&self, config: &LlamacppConfig) -> Result<(), ValidationError> {
        if config.provider.api_key.is_none() {
            return Ok(());
        }

        let conflicting = config
            .provider
            .headers
            .keys()
            .find(|name| name.eq_ignore_ascii_case("authorization"));

        if let Some(name) = conflicting {
            return Err(ValidationError::new(
                format!("provider.headers.{}", name),
                ValidationErrorKind::Conflict {
                    message: "Authorization header conflicts with provider.api_key".to_string(),
                },
            )
            .with_hint("Set either api_key or an Authorization header, not both"));
        }

        Ok(())
    }

    /// Warn when a key would travel over plain HTTP to a non-local host
    fn check_cleartext_credentials(&self, config: &LlamacppConfig) {
        if config.provider.api_key.is_none() {
            return;
        }

        if let Ok(url) = url::Url::parse(&config.provider.base_url) {
            let local = matches!(
                url.host_str(),
                Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("::1")
            );
            if url.scheme() == "http" && !local {
                warn!(
                    base_url = %config.provider.base_url,
                    "API key configured for a non-local plain HTTP endpoint"
                );
            }
        }
    }
}
