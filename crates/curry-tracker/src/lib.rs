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

//! HTTP client for Gazelle-style trackers.
//!
//! Layout: `client.rs` (`TrackerClient`: JSON actions, API and session
//! uploads, torrent downloads), `wire.rs` (JSON payloads into domain records),
//! `form.rs` (multipart upload body), `error_page.rs` (rejection message
//! scraping).

pub mod client;
pub mod error_page;
pub mod form;
pub mod wire;

pub use client::TrackerClient;
