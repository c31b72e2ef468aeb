//! Content-hashing capability: builds a torrent from a local directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{TorrentError, TorrentResult};

const BINARY: &str = "mktorrent";
const MIN_VERSION: (u32, u32) = (1, 1);

static VERSION_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"mktorrent (\d+)\.(\d+)").ok());

/// Everything needed to hash one content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRequest {
    /// Directory whose files are hashed.
    pub content_dir: PathBuf,
    /// Where the torrent file is written; must not exist yet.
    pub output: PathBuf,
    /// Announce URL embedded in the torrent.
    pub announce: String,
    /// Label written into `info.source`.
    pub source_label: String,
}

/// Produces a private torrent for a content directory.
#[async_trait]
pub trait ContentHasher: Send + Sync {
    /// Hash `request.content_dir` and write the torrent to `request.output`.
    async fn create_torrent(&self, request: &HashRequest) -> TorrentResult<()>;
}

/// [`ContentHasher`] backed by the `mktorrent` binary.
#[derive(Debug, Clone)]
pub struct Mktorrent {
    binary: PathBuf,
}

impl Mktorrent {
    /// Use a specific binary without checking it.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Find the first `mktorrent` on `PATH` reporting version 1.1 or newer.
    ///
    /// # Errors
    ///
    /// Returns `HasherUnavailable` when no binary exists or none is recent enough.
    pub async fn locate() -> TorrentResult<Self> {
        let candidates: Vec<PathBuf> = std::env::var_os("PATH")
            .map_or_else(Vec::new, |paths| std::env::split_paths(&paths).collect())
            .into_iter()
            .map(|dir| dir.join(BINARY))
            .filter(|candidate| candidate.is_file())
            .collect();
        if candidates.is_empty() {
            return Err(TorrentError::HasherUnavailable {
                reason: "mktorrent was not found on PATH",
            });
        }
        for candidate in candidates {
            match probe_version(&candidate).await {
                Some(version) if version >= MIN_VERSION => {
                    info!(
                        binary = %candidate.display(),
                        version = %format!("{}.{}", version.0, version.1),
                        "using content hasher"
                    );
                    return Ok(Self::with_binary(candidate));
                }
                version => debug!(binary = %candidate.display(), ?version, "skipping mktorrent"),
            }
        }
        Err(TorrentError::HasherUnavailable {
            reason: "mktorrent 1.1 or newer is required",
        })
    }

    /// Path of the binary in use.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl ContentHasher for Mktorrent {
    async fn create_torrent(&self, request: &HashRequest) -> TorrentResult<()> {
        let output = Command::new(&self.binary)
            .arg("-p")
            .arg("-s")
            .arg(&request.source_label)
            .arg("-o")
            .arg(&request.output)
            .arg("-a")
            .arg(&request.announce)
            .arg(&request.content_dir)
            .output()
            .await
            .map_err(|source| TorrentError::io("spawn_mktorrent", &self.binary, source))?;
        if !output.status.success() {
            return Err(TorrentError::HasherFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

async fn probe_version(binary: &Path) -> Option<(u32, u32)> {
    let output = Command::new(binary).arg("-v").output().await.ok()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    parse_version(&text)
}

fn parse_version(text: &str) -> Option<(u32, u32)> {
    let captures = VERSION_PATTERN.as_ref()?.captures(text)?;
    let major = captures.get(1)?.as_str().parse().ok()?;
    let minor = captures.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}
