//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a configuration input failed.
    #[error("configuration file could not be read")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The YAML document did not match the configuration schema.
    #[error("configuration file is malformed")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Tracker has neither a cookie nor an API key.
    #[error("tracker credential missing")]
    MissingCredential {
        /// Tracker section (`source` or `target`).
        section: &'static str,
    },
}

impl ConfigError {
    /// One-line description including the structured context.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Io {
                operation, path, source,
            } => format!("{self}: {operation} '{}': {source}", path.display()),
            Self::Parse { path, source } => format!("{self}: '{}': {source}", path.display()),
            Self::InvalidField {
                section,
                field,
                value,
                reason,
            } => match value {
                Some(value) => format!("{self}: {section}.{field} = '{value}' {reason}"),
                None => format!("{self}: {section}.{field} {reason}"),
            },
            Self::MissingCredential { section } => format!(
                "{self}: {section} needs a cookie, cookie_file or api_key"
            ),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
