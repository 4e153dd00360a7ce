//! Errors raised while loading configuration or validating option bags
//!
//! [`ValidationError`] is shared by the file loader and by the per-call
//! `providerOptions.llamacpp` parser, so its `field_path` uses whichever
//! naming the caller wrote: `provider.base_url` for files,
//! `providerOptions.llamacpp.topP` for call options.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Yaml => f.write_str("YAML"),
            ConfigFormat::Json => f.write_str("JSON"),
        }
    }
}

/// Failure to produce a usable [`LlamacppConfig`](super::LlamacppConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {format} config '{}' at {}:{}: {message}",
            .path.display(), .line.unwrap_or(0), .column.unwrap_or(0))]
    Parse {
        path: PathBuf,
        format: ConfigFormat,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("cannot infer config format from '{}' (expected .yaml, .yml or .json)", .path.display())]
    UnknownFormat { path: PathBuf },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("environment variable '{var}' referenced by the config is not set")]
    MissingEnvVar { var: String },
}

impl ConfigError {
    /// Field that failed validation, if this is a validation failure
    pub fn field_path(&self) -> Option<&str> {
        match self {
            ConfigError::Validation(err) => Some(&err.field_path),
            _ => None,
        }
    }
}

/// A rejected value and where it sits
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
    /// How to fix it, when there is something useful to say
    pub hint: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    #[error("value is required")]
    Missing,

    #[error("expected {expected}, got {actual}")]
    InvalidValue { expected: String, actual: String },

    #[error("out of range: {message}")]
    OutOfRange { message: String },

    #[error("malformed: {message}")]
    InvalidFormat { message: String },

    #[error("conflicting settings: {message}")]
    Conflict { message: String },

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("unsupported config version {found} (this build reads {supported})")]
    UnsupportedVersion { supported: String, found: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn missing(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::Missing)
    }

    pub fn invalid_value(
        field_path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidValue {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }

    pub fn invalid_format(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidFormat {
                message: message.into(),
            },
        )
    }

    pub fn invalid_url(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidUrl {
                message: message.into(),
            },
        )
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
