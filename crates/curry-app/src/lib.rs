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

//! Release migration runs: input resolution, the sequential pipeline and the
//! `curry` binary's wiring.
//!
//! Layout: `input.rs` (torrent ids and batch folders), `orchestrator.rs`
//! (`MigrationOrchestrator`), `bootstrap.rs` (configuration, clients, index
//! keys, hasher), `cli.rs` (`clap` surface), `error.rs` (exit codes).

/// Configuration, client and hasher wiring.
pub mod bootstrap;
pub mod cli;
pub mod error;
pub mod input;
pub mod orchestrator;

pub use bootstrap::{RunOptions, run, run_with};
pub use cli::{Cli, execute};
pub use error::{AppError, AppResult};
pub use input::{InputRef, parse_input};
pub use orchestrator::{
    BatchReport, MigrationOrchestrator, OrchestratorParts, Outcome, TaskReport,
};
