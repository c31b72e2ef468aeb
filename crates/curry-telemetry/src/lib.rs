#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    unused,
    unreachable_pub,
    missing_docs,
    clippy::pedantic,
    clippy::nursery
)]

//! Logging bootstrap and run-level spans.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (run and task
//! spans), `error.rs`.

pub mod context;
pub mod error;
pub mod init;

pub use context::{RunContext, record_release, task_span};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
