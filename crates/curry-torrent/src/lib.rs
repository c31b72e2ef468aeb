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

//! Torrent file handling for release migration.
//!
//! Layout: `bencode.rs` (codec), `metainfo.rs` (announce matching, info-hash,
//! rebranding), `hasher.rs` (`ContentHasher` + `mktorrent`), `resolver.rs`
//! (`TorrentFileResolver`), `error.rs`.

pub mod bencode;
pub mod error;
pub mod hasher;
pub mod metainfo;
pub mod resolver;

pub use error::{TorrentError, TorrentResult};
pub use hasher::{ContentHasher, HashRequest, Mktorrent};
pub use metainfo::{AnnounceMatch, Metainfo};
pub use resolver::{
    ResolvedTorrent, ResolverContext, ResolverSettings, Strategy, TorrentFileResolver,
};
