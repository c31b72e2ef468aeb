//! Turns the command-line input into work items.

use std::path::{Path, PathBuf};

use curry_torrent::{AnnounceMatch, Metainfo};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{AppError, AppResult};

const TORRENT_ID_MARKER: &str = "torrentid=";
const TORRENT_EXTENSION: &str = "torrent";

/// What the user asked to migrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRef {
    /// One release on the source tracker.
    TorrentId(u64),
    /// A folder of `.torrent` files from the source tracker.
    Directory(PathBuf),
}

/// How a work item's release is looked up on the source tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// By torrent id.
    Id(u64),
    /// By upper-case info-hash.
    Hash(String),
}

/// A resolved work item, not yet fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    /// Human-readable origin (torrent id or local file).
    pub label: String,
    /// Source lookup key.
    pub lookup: Lookup,
    /// Folder the generated torrent is moved to on success.
    pub destination_folder: Option<PathBuf>,
}

/// Interpret `raw` as a folder, a source URL with `torrentid=`, or a bare id.
///
/// # Errors
///
/// Returns `InvalidInput` when none of the forms match.
pub fn parse_input(raw: &str) -> AppResult<InputRef> {
    let trimmed = raw.trim();
    let path = Path::new(trimmed);
    if path.is_dir() {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        return Ok(InputRef::Directory(absolute));
    }
    let candidate = trimmed
        .rsplit_once(TORRENT_ID_MARKER)
        .map_or(trimmed, |(_, rest)| {
            rest.split(['&', '#']).next().unwrap_or_default()
        });
    match candidate.parse::<u64>() {
        Ok(id) if id > 0 => Ok(InputRef::TorrentId(id)),
        _ => Err(AppError::InvalidInput {
            value: raw.to_string(),
            reason: "expected a folder, a torrent URL with torrentid=, or a torrent id",
        }),
    }
}

/// Build the work item for a single torrent id.
#[must_use]
pub fn single_task(torrent_id: u64, torrent_folder: Option<&Path>) -> TaskInput {
    TaskInput {
        label: format!("torrentid={torrent_id}"),
        lookup: Lookup::Id(torrent_id),
        destination_folder: torrent_folder.filter(|folder| folder.is_dir()).map(Path::to_path_buf),
    }
}

/// Scan `folder` (not recursively) for torrents announcing to `source_host`.
///
/// Undecodable files and torrents for other trackers are skipped with a
/// warning.
///
/// # Errors
///
/// Returns `EmptyBatch` when the folder holds no torrent files or none of
/// them match.
pub fn scan_directory(folder: &Path, source_host: &str) -> AppResult<Vec<TaskInput>> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable folder entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(TORRENT_EXTENSION))
        })
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(AppError::EmptyBatch {
            path: folder.to_path_buf(),
            reason: "no .torrent files found",
        });
    }

    let total = files.len();
    let tasks: Vec<TaskInput> = files
        .into_iter()
        .filter_map(|path| match_torrent(&path, folder, source_host))
        .collect();
    debug!(total, matched = tasks.len(), "scanned batch folder");
    if tasks.is_empty() {
        return Err(AppError::EmptyBatch {
            path: folder.to_path_buf(),
            reason: "no torrents announce to the source tracker",
        });
    }
    Ok(tasks)
}

fn match_torrent(path: &Path, folder: &Path, source_host: &str) -> Option<TaskInput> {
    let metainfo = match Metainfo::read(path) {
        Ok(metainfo) => metainfo,
        Err(err) => {
            warn!(path = %path.display(), error = %err.detail(), "skipping: could not decode torrent");
            return None;
        }
    };
    match metainfo.announces_to(source_host) {
        AnnounceMatch::Matches => Some(TaskInput {
            label: path.display().to_string(),
            lookup: Lookup::Hash(metainfo.info_hash()),
            destination_folder: Some(folder.to_path_buf()),
        }),
        AnnounceMatch::Elsewhere => {
            warn!(path = %path.display(), "skipping: announce host does not match the source tracker");
            None
        }
        AnnounceMatch::Missing => {
            warn!(path = %path.display(), "skipping: torrent has no announce information");
            None
        }
    }
}
