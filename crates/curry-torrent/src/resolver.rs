//! Produces the destination torrent for a release.
//!
//! Two strategies are used:
//! - **Hash**: the release folder exists under the seeding root and a content
//!   hasher is available, so a fresh private torrent is built from disk.
//! - **Patch**: otherwise the source tracker's own torrent is downloaded and
//!   rebranded for the destination. Piece hashes are never recomputed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use curry_core::{
    Attachment, GeneratedTorrentFile, IndexInfo, MigrationError, MigrationResult,
    SourceReleaseRecord, TorrentDownloader, TrackerEndpoint,
};
use tracing::{debug, info, warn};

use crate::error::TorrentError;
use crate::hasher::{ContentHasher, HashRequest};
use crate::metainfo::Metainfo;

/// Which way a torrent was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Built from local content by the content hasher.
    Hash,
    /// Source torrent downloaded and rebranded.
    Patch,
}

impl Strategy {
    /// Lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Patch => "patch",
        }
    }
}

/// Paths and switches the resolver works with.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Root folder holding seeded release folders.
    pub seeding_folder: PathBuf,
    /// Folder generated torrents are written to.
    pub work_dir: PathBuf,
    /// Whether patched torrents get their `info.source` replaced.
    pub rewrite_source_tag: bool,
}

/// Per-run identities the resolver needs on both trackers.
#[derive(Debug, Clone)]
pub struct ResolverContext {
    /// Source tracker endpoint.
    pub source: TrackerEndpoint,
    /// Running user's keys on the source.
    pub source_keys: IndexInfo,
    /// Destination tracker endpoint.
    pub destination: TrackerEndpoint,
    /// Running user's keys on the destination.
    pub destination_keys: IndexInfo,
}

/// Output of a successful resolution.
#[derive(Debug)]
pub struct ResolvedTorrent {
    /// The torrent written for the destination.
    pub file: GeneratedTorrentFile,
    /// Log attachments for the upload.
    pub logs: Vec<Attachment>,
    /// Strategy that produced `file`.
    pub strategy: Strategy,
}

/// Turns a [`SourceReleaseRecord`] into a destination-ready torrent file.
pub struct TorrentFileResolver {
    settings: ResolverSettings,
    context: ResolverContext,
    hasher: Option<Arc<dyn ContentHasher>>,
    downloader: Arc<dyn TorrentDownloader>,
}

impl TorrentFileResolver {
    /// Create a resolver. Without a hasher every release is patched.
    #[must_use]
    pub fn new(
        settings: ResolverSettings,
        context: ResolverContext,
        hasher: Option<Arc<dyn ContentHasher>>,
        downloader: Arc<dyn TorrentDownloader>,
    ) -> Self {
        Self {
            settings,
            context,
            hasher,
            downloader,
        }
    }

    /// Deterministic output path for `record`:
    /// `<work_dir>/<file_path>-<destination short name>.torrent`.
    #[must_use]
    pub fn output_path(&self, record: &SourceReleaseRecord) -> PathBuf {
        let stem = record.file_path.replace(['/', '\\'], "_");
        self.settings.work_dir.join(format!(
            "{stem}-{}.torrent",
            self.context.destination.short_name()
        ))
    }

    /// Local content folder for `record`.
    #[must_use]
    pub fn content_dir(&self, record: &SourceReleaseRecord) -> PathBuf {
        self.settings.seeding_folder.join(&record.file_path)
    }

    /// Produce the destination torrent and collect log attachments.
    ///
    /// Any file already at the output path is removed first, so a rerun
    /// recreates it.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a release without a folder, `Generation` when the
    /// hasher fails, `Protocol`/`Auth` from the download, `Io` for local
    /// filesystem failures.
    pub async fn resolve(&self, record: &SourceReleaseRecord) -> MigrationResult<ResolvedTorrent> {
        if record.file_path.trim().is_empty() {
            return Err(MigrationError::invalid_input(
                "release is not enclosed in a folder",
            ));
        }
        let output = self.output_path(record);
        remove_stale(&output)?;

        let content_dir = self.content_dir(record);
        let content_present = content_dir.is_dir();
        let strategy = match (&self.hasher, content_present) {
            (Some(hasher), true) => {
                self.hash(hasher.as_ref(), &content_dir, &output).await?;
                Strategy::Hash
            }
            _ => {
                if content_present {
                    debug!(path = %content_dir.display(), "no content hasher, patching source torrent");
                } else {
                    info!(
                        path = %content_dir.display(),
                        "content not found locally, patching source torrent"
                    );
                }
                self.patch(record, &output).await?;
                Strategy::Patch
            }
        };
        let file = GeneratedTorrentFile::claim(&output)?;
        let logs = match self.collect_logs(record, &content_dir, content_present) {
            Ok(logs) => logs,
            Err(err) => {
                if let Err(discard) = file.discard() {
                    warn!(error = %discard, "failed to remove torrent after log failure");
                }
                return Err(err);
            }
        };
        info!(
            strategy = strategy.as_str(),
            path = %file.path().display(),
            logs = logs.len(),
            "torrent ready"
        );
        Ok(ResolvedTorrent {
            file,
            logs,
            strategy,
        })
    }

    async fn hash(
        &self,
        hasher: &dyn ContentHasher,
        content_dir: &Path,
        output: &Path,
    ) -> MigrationResult<()> {
        let destination = &self.context.destination;
        let request = HashRequest {
            content_dir: content_dir.to_path_buf(),
            output: output.to_path_buf(),
            announce: destination.announce_url(&self.context.destination_keys.passkey),
            source_label: destination.acronym.clone(),
        };
        if let Err(err) = hasher.create_torrent(&request).await {
            // A partial file must not be picked up by the next run.
            remove_stale(output)?;
            return Err(MigrationError::from(err).with_tracker(destination.acronym.clone()));
        }
        Ok(())
    }

    async fn patch(&self, record: &SourceReleaseRecord, output: &Path) -> MigrationResult<()> {
        let keys = &self.context.source_keys;
        let bytes = self
            .downloader
            .download_torrent(record.torrent_id, &keys.authkey, &keys.passkey)
            .await?;
        let mut metainfo = Metainfo::from_bytes(&bytes)
            .map_err(|err| MigrationError::from(err).with_tracker(self.context.source.acronym.clone()))?;
        let destination = &self.context.destination;
        metainfo.rebrand(
            &destination.announce_url(&self.context.destination_keys.passkey),
            &destination.base_url,
            &destination.acronym,
            self.settings.rewrite_source_tag,
        );
        fs::write(output, metainfo.to_bytes())
            .map_err(|source| MigrationError::from(TorrentError::io("write_torrent", output, source)))
    }

    fn collect_logs(
        &self,
        record: &SourceReleaseRecord,
        content_dir: &Path,
        content_present: bool,
    ) -> MigrationResult<Vec<Attachment>> {
        if !record.has_log {
            return Ok(Vec::new());
        }
        if !content_present {
            if self.context.destination.requires_log_field {
                debug!("content absent, sending empty log placeholder");
                return Ok(vec![Attachment::empty_log()]);
            }
            warn!(
                torrent_id = record.torrent_id,
                "content absent, skipping log attachments"
            );
            return Ok(Vec::new());
        }
        record
            .log_files()
            .into_iter()
            .map(|relative| {
                let path = content_dir.join(relative);
                let bytes = fs::read(&path)
                    .map_err(|source| MigrationError::io("read_log", &path, source))?;
                let file_name = Path::new(relative)
                    .file_name()
                    .map_or_else(|| relative.to_string(), |name| name.to_string_lossy().into_owned());
                Ok(Attachment {
                    file_name,
                    mime: Attachment::LOG_MIME,
                    bytes,
                })
            })
            .collect()
    }
}

fn remove_stale(path: &Path) -> MigrationResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale torrent");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(MigrationError::io("remove_stale_torrent", path, err)),
    }
}
