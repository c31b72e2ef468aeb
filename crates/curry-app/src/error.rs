//! # Design
//!
//! - Centralize run-level errors for bootstrap and orchestration.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Split validation failures (exit 2) from operational failures (exit 3).

use std::path::PathBuf;

use curry_core::MigrationError;
use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or validated.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: curry_config::ConfigError,
    },
    /// Telemetry could not be initialised.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: curry_telemetry::TelemetryError,
    },
    /// A failure that ends the whole run (credentials, index fetch).
    #[error("migration run aborted")]
    Migration {
        /// Operation identifier.
        operation: &'static str,
        /// Source pipeline error.
        source: MigrationError,
    },
    /// No usable content hasher.
    #[error("content hasher unavailable")]
    Hasher {
        /// Source torrent error.
        source: curry_torrent::TorrentError,
    },
    /// The command-line input could not be interpreted.
    #[error("invalid input")]
    InvalidInput {
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A batch folder produced nothing to migrate.
    #[error("nothing to migrate")]
    EmptyBatch {
        /// Folder that was scanned.
        path: PathBuf,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: curry_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: curry_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn migration(operation: &'static str, source: MigrationError) -> Self {
        Self::Migration { operation, source }
    }

    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidInput { .. } | Self::EmptyBatch { .. } => 2,
            Self::Telemetry { .. } | Self::Migration { .. } | Self::Hasher { .. } => 3,
        }
    }

    /// One-line message for the terminal.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Config { operation, source } => format!("{operation}: {}", source.detail()),
            Self::Telemetry { operation, source } => format!("{self} ({operation}): {source}"),
            Self::Migration { operation, source } => format!("{self} ({operation}): {source}"),
            Self::Hasher { source } => format!("{self}: {}", source.detail()),
            Self::InvalidInput { value, reason } => format!("{self} '{value}': {reason}"),
            Self::EmptyBatch { path, reason } => format!("{self} in '{}': {reason}", path.display()),
        }
    }
}
