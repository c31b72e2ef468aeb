//! # Design
//!
//! - One closed error type for the whole migration pipeline.
//! - Every failure carries its kind, a human-readable message and, when known,
//!   the tracker endpoint it originated from.
//! - Only `Auth` is fatal to a whole run; every other kind ends the current task.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::Path;

use thiserror::Error;

/// Result alias for migration pipeline operations.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Enumerates every way a migration step can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or expired credential, or a redirect to the login page.
    Auth,
    /// Transport or API-level failure that is not an explicit rejection.
    Protocol,
    /// The destination explicitly rejected the upload.
    Upload,
    /// The content-hashing capability failed to produce a torrent.
    Generation,
    /// The release looks like it was already migrated to the destination.
    AlreadyMigrated,
    /// A caller-supplied value could not be interpreted.
    InvalidInput,
    /// Local filesystem failure.
    Io,
}

impl ErrorKind {
    /// Stable lowercase label used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Protocol => "protocol",
            Self::Upload => "upload",
            Self::Generation => "generation",
            Self::AlreadyMigrated => "already_migrated",
            Self::InvalidInput => "invalid_input",
            Self::Io => "io",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Pipeline error carrying kind, message and the originating tracker.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct MigrationError {
    kind: ErrorKind,
    message: String,
    tracker: Option<String>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl MigrationError {
    /// Build an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tracker: None,
            source: None,
        }
    }

    /// Credential missing, expired or redirected to login.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    /// Transport or API-level failure.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Explicit rejection by the destination, message shown verbatim.
    pub fn upload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upload, message)
    }

    /// Content-hashing failure.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generation, message)
    }

    /// Self-repost guard tripped.
    pub fn already_migrated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyMigrated, message)
    }

    /// Caller-supplied value could not be interpreted.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Filesystem failure at `path` during `operation`.
    pub fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::new(
            ErrorKind::Io,
            format!("{operation} failed for '{}'", path.display()),
        )
        .with_source(source)
    }

    /// Attach the tracker acronym the failure originated from.
    #[must_use]
    pub fn with_tracker(mut self, tracker: impl Into<String>) -> Self {
        self.tracker = Some(tracker.into());
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Kind of failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message, verbatim from the tracker for upload rejections.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Tracker acronym the failure originated from, when known.
    #[must_use]
    pub fn tracker(&self) -> Option<&str> {
        self.tracker.as_deref()
    }

    /// Whether the failure must abort the whole run rather than a single task.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Auth)
    }
}
