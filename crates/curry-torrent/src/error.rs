//! # Design
//!
//! - Constant-message errors with structured context for torrent handling.
//! - Converted into the pipeline's `MigrationError` at the crate boundary.

use std::io;
use std::path::PathBuf;

use curry_core::{ErrorKind, MigrationError};
use thiserror::Error;

use crate::bencode::BencodeError;

/// Result alias for torrent operations.
pub type TorrentResult<T> = Result<T, TorrentError>;

/// Errors produced while reading, patching or generating torrent files.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// Torrent bytes were not valid bencode.
    #[error("torrent decode failure")]
    Decode {
        /// File the bytes came from, when known.
        path: Option<PathBuf>,
        /// Underlying codec error.
        source: BencodeError,
    },
    /// A required metainfo field was missing or had the wrong type.
    #[error("torrent field missing")]
    MissingField {
        /// Field name.
        field: &'static str,
    },
    /// IO failures while touching torrent files or content.
    #[error("torrent io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// No usable content-hashing binary was found.
    #[error("content hasher unavailable")]
    HasherUnavailable {
        /// Static reason.
        reason: &'static str,
    },
    /// The content hasher ran but exited unsuccessfully.
    #[error("content hasher failed")]
    HasherFailed {
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
}

impl TorrentError {
    /// Wrap an IO error with its operation and path.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Description including the structured context.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Decode { path, source } => match path {
                Some(path) => format!("{source} in '{}'", path.display()),
                None => source.to_string(),
            },
            Self::MissingField { field } => format!("missing field '{field}'"),
            Self::Io {
                operation, path, ..
            } => format!("{operation} failed for '{}'", path.display()),
            Self::HasherUnavailable { reason } => (*reason).to_string(),
            Self::HasherFailed { code, stderr } => {
                let code = code.map_or_else(|| "signal".to_string(), |code| code.to_string());
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    format!("exit status {code}")
                } else {
                    format!("exit status {code}: {stderr}")
                }
            }
        }
    }
}

impl From<TorrentError> for MigrationError {
    fn from(err: TorrentError) -> Self {
        let kind = match err {
            TorrentError::Decode { .. } | TorrentError::MissingField { .. } => {
                ErrorKind::InvalidInput
            }
            TorrentError::Io { .. } => ErrorKind::Io,
            TorrentError::HasherUnavailable { .. } | TorrentError::HasherFailed { .. } => {
                ErrorKind::Generation
            }
        };
        Self::new(kind, format!("{err}: {}", err.detail())).with_source(err)
    }
}
