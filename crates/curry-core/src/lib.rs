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

//! Domain model, error type and metadata mapping for tracker-to-tracker
//! release migration.
//!
//! Layout: `model.rs` (records, endpoints, payloads), `error.rs` (closed
//! pipeline error), `taxonomy.rs` (release-type translation), `mapper.rs`
//! (`MetadataMapper`), `download.rs` (torrent download seam).

pub mod download;
pub mod error;
pub mod mapper;
pub mod model;
pub mod taxonomy;

pub use download::TorrentDownloader;
pub use error::{ErrorKind, MigrationError, MigrationResult};
pub use mapper::MetadataMapper;
pub use model::{
    ArtistRole, Attachment, Credential, FileEntry, GeneratedTorrentFile, IndexInfo,
    MigrationTask, ReleaseGroup, SourceReleaseRecord, TaskState, TrackerEndpoint, UploadPayload,
};
pub use taxonomy::Taxonomy;
