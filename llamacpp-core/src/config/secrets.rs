//! Credential wrapper and header redaction for log output

use serde::{Deserialize, Serialize};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Header name fragments whose values never reach the logs
const SENSITIVE_HEADER_FRAGMENTS: [&str; 7] = [
    "authorization",
    "api-key",
    "api_key",
    "token",
    "secret",
    "cookie",
    "password",
];

/// An API key or similar credential
///
/// `Debug` and `Display` both print `[REDACTED]`; the only way to the raw
/// value is [`expose_secret`](Self::expose_secret).
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Authorization` header value carrying this key
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Whether a header name looks like it carries a credential
pub fn is_sensitive_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_HEADER_FRAGMENTS
        .iter()
        .any(|fragment| name.contains(fragment))
}

/// Header value as it may appear in a log line
pub fn redact_header<'a>(name: &str, value: &'a str) -> &'a str {
    if is_sensitive_header(name) {
        REDACTED
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_never_formats_its_value() {
        let secret = SecretString::new("sk-1234567890abcdef");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(secret.expose_secret(), "sk-1234567890abcdef");
        assert_eq!(secret.bearer(), "Bearer sk-1234567890abcdef");
    }

    #[test]
    fn test_redact_header() {
        assert_eq!(redact_header("Authorization", "Bearer x"), "[REDACTED]");
        assert_eq!(redact_header("X-Api-Key", "abc"), "[REDACTED]");
        assert_eq!(redact_header("Cookie", "session=1"), "[REDACTED]");
        assert_eq!(redact_header("Content-Type", "application/json"), "application/json");
        assert_eq!(redact_header("X-Request-ID", "42"), "42");
    }
}
