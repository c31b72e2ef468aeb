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

//! File-backed configuration for the migrator.
//!
//! Layout: `model.rs` (typed document), `loader.rs` (YAML + environment
//! overrides), `validate.rs` (field checks), `defaults.rs`, `error.rs`.

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, load, load_with, resolve_path};
pub use model::{CurryConfig, TrackerConfig};
