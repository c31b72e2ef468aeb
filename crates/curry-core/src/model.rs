//! Domain types shared by every stage of the migration pipeline.
//!
//! # Design
//! - Records fetched from a tracker are immutable once built.
//! - Artist credits are keyed by [`ArtistRole`], whose declaration order is the
//!   fixed emission order for uploads.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MigrationError, MigrationResult};
use crate::taxonomy::Taxonomy;

/// Artist role categories understood by Gazelle upload forms.
///
/// Variant order is the emission order of artist lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArtistRole {
    /// Main artist.
    Primary,
    /// Guest ("with") artist.
    Guest,
    /// Remixer.
    Remixer,
    /// Composer.
    Composer,
    /// Conductor.
    Conductor,
    /// DJ / compiler.
    Dj,
    /// Producer.
    Producer,
}

impl ArtistRole {
    /// Every role in emission order.
    pub const ALL: [Self; 7] = [
        Self::Primary,
        Self::Guest,
        Self::Remixer,
        Self::Composer,
        Self::Conductor,
        Self::Dj,
        Self::Producer,
    ];

    /// Numeric role weight sent alongside each artist name (`importance[]`).
    #[must_use]
    pub const fn weight(self) -> u8 {
        match self {
            Self::Primary => 1,
            Self::Guest => 2,
            Self::Remixer => 3,
            Self::Composer => 4,
            Self::Conductor => 5,
            Self::Dj => 6,
            Self::Producer => 7,
        }
    }

    /// Key used for the role inside a tracker's `musicInfo` object.
    #[must_use]
    pub const fn wire_key(self) -> &'static str {
        match self {
            Self::Primary => "artists",
            Self::Guest => "with",
            Self::Remixer => "remixedBy",
            Self::Composer => "composers",
            Self::Conductor => "conductor",
            Self::Dj => "dj",
            Self::Producer => "producer",
        }
    }
}

/// One entry of a torrent's file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the release folder.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

/// Group-level (release-wide) metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseGroup {
    /// Release title.
    pub name: String,
    /// Original release year.
    pub year: u32,
    /// Original record label.
    pub record_label: String,
    /// Original catalogue number.
    pub catalogue_number: String,
    /// Release-type code in the source tracker's taxonomy.
    pub release_type: u32,
    /// Tag list.
    pub tags: Vec<String>,
    /// Free-text album description (BBCode).
    pub description: String,
    /// Cover image URL.
    pub wiki_image: String,
    /// Artist names keyed by role.
    pub artists: BTreeMap<ArtistRole, Vec<String>>,
}

/// Canonical metadata for one torrent as published by the source tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceReleaseRecord {
    /// Torrent identifier on the source tracker.
    pub torrent_id: u64,
    /// Content-addressing info-hash, upper-case hex.
    pub info_hash: String,
    /// Release folder path relative to the seeding root.
    pub file_path: String,
    /// Uploader's user id on the source tracker.
    pub uploader_id: u64,
    /// Uploader's user name on the source tracker.
    pub uploader_name: String,
    /// Audio format (e.g. `FLAC`).
    pub format: String,
    /// Source media (e.g. `CD`, `WEB`).
    pub media: String,
    /// Encoding / bitrate (e.g. `Lossless`).
    pub encoding: String,
    /// Whether the torrent declares rip logs.
    pub has_log: bool,
    /// Files contained in the torrent.
    pub file_list: Vec<FileEntry>,
    /// Remaster year override, `0` when unset.
    pub remaster_year: u32,
    /// Remaster record label override.
    pub remaster_record_label: String,
    /// Remaster catalogue number override.
    pub remaster_catalogue_number: String,
    /// Remaster title.
    pub remaster_title: String,
    /// Scene release flag.
    pub scene: bool,
    /// Torrent-level free-text description (BBCode).
    pub description: String,
    /// Parent release group.
    pub group: ReleaseGroup,
}

impl SourceReleaseRecord {
    /// Paths of every `.log` file listed in the torrent.
    #[must_use]
    pub fn log_files(&self) -> Vec<&str> {
        self.file_list
            .iter()
            .map(|entry| entry.path.as_str())
            .filter(|path| path.to_ascii_lowercase().ends_with(".log"))
            .collect()
    }

    /// Whether either description mentions `needle`.
    #[must_use]
    pub fn descriptions_contain(&self, needle: &str) -> bool {
        self.description.contains(needle) || self.group.description.contains(needle)
    }
}

/// Credential used to authenticate against a tracker.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Browser session cookie header value.
    SessionCookie(String),
    /// API key sent in the `Authorization` header.
    ApiKey(String),
}

impl Credential {
    /// Whether the credential carries a non-blank value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::SessionCookie(value) | Self::ApiKey(value) => !value.trim().is_empty(),
        }
    }

    /// Label for logs that never reveals the secret.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SessionCookie(_) => "session_cookie",
            Self::ApiKey(_) => "api_key",
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "Credential::{}(<redacted>)", self.label())
    }
}

/// Static description of one tracker.
#[derive(Debug, Clone)]
pub struct TrackerEndpoint {
    /// Web base URL, without trailing slash.
    pub base_url: String,
    /// Host used in announce URLs.
    pub announce_host: String,
    /// Short acronym (e.g. `RED`).
    pub acronym: String,
    /// Authentication credential.
    pub credential: Credential,
    /// Release-type taxonomy used by the tracker.
    pub taxonomy: Taxonomy,
    /// Whether uploads must always carry a log attachment field.
    pub requires_log_field: bool,
}

impl TrackerEndpoint {
    /// Host of the base URL with everything but letters and dots removed.
    #[must_use]
    pub fn short_name(&self) -> String {
        let host = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        host.chars()
            .filter(|ch| ch.is_alphabetic() || *ch == '.')
            .collect()
    }

    /// Announce URL embedding `passkey`.
    #[must_use]
    pub fn announce_url(&self, passkey: &str) -> String {
        format!("https://{}/{passkey}/announce", self.announce_host)
    }

    /// Public page of a torrent on this tracker.
    #[must_use]
    pub fn torrent_page(&self, torrent_id: u64) -> String {
        format!("{}/torrents.php?torrentid={torrent_id}", self.base_url)
    }
}

/// Per-user keys returned by a tracker's `index` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IndexInfo {
    /// Authenticated user's id.
    pub id: u64,
    /// Form/auth key.
    pub authkey: String,
    /// Announce passkey.
    pub passkey: String,
}

/// Unit of work: one release plus where its new torrent should end up.
#[derive(Debug, Clone)]
pub struct MigrationTask {
    /// Release metadata fetched from the source tracker.
    pub record: SourceReleaseRecord,
    /// Folder the generated torrent is moved to on success.
    pub destination_folder: Option<PathBuf>,
}

/// Lifecycle of a task through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Input resolved into a task.
    Resolved,
    /// Source metadata fetched.
    Fetched,
    /// Destination torrent file on disk.
    Generated,
    /// Upload payload built.
    Mapped,
    /// Destination accepted the upload.
    Uploaded,
    /// Task aborted.
    Failed,
}

impl TaskState {
    /// Lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Fetched => "fetched",
            Self::Generated => "generated",
            Self::Mapped => "mapped",
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
        }
    }
}

/// Torrent file produced for the destination, living on local disk.
#[derive(Debug, PartialEq, Eq)]
pub struct GeneratedTorrentFile {
    path: PathBuf,
}

impl GeneratedTorrentFile {
    /// Claim an existing file on disk.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error when nothing exists at `path`.
    pub fn claim(path: impl Into<PathBuf>) -> MigrationResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(MigrationError::io(
                "claim_generated_torrent",
                &path,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        Ok(Self { path })
    }

    /// Location on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
    }

    /// Read the torrent into an upload attachment.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error when the file cannot be read.
    pub fn to_attachment(&self) -> MigrationResult<Attachment> {
        let bytes = fs::read(&self.path)
            .map_err(|source| MigrationError::io("read_generated_torrent", &self.path, source))?;
        Ok(Attachment {
            file_name: self.file_name(),
            mime: Attachment::TORRENT_MIME,
            bytes,
        })
    }

    /// Delete the file.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error when the file exists but cannot be removed.
    pub fn discard(self) -> MigrationResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MigrationError::io("remove_generated_torrent", &self.path, err)),
        }
    }

    /// Copy the file into `folder` then delete the original.
    ///
    /// A copy is used rather than a rename so the move works across filesystems
    /// and into folders where rename is not permitted.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error when the copy or the removal fails.
    pub fn relocate(self, folder: &Path) -> MigrationResult<PathBuf> {
        let target = folder.join(self.file_name());
        fs::copy(&self.path, &target)
            .map_err(|source| MigrationError::io("copy_generated_torrent", &target, source))?;
        fs::remove_file(&self.path)
            .map_err(|source| MigrationError::io("remove_generated_torrent", &self.path, source))?;
        Ok(target)
    }
}

/// File attached to an upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name reported to the tracker.
    pub file_name: String,
    /// MIME type.
    pub mime: &'static str,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// MIME type of torrent files.
    pub const TORRENT_MIME: &'static str = "application/x-bittorrent";
    /// MIME type of log files.
    pub const LOG_MIME: &'static str = "application/octet-stream";

    /// Empty log attachment for destinations that insist on the field.
    #[must_use]
    pub fn empty_log() -> Self {
        Self {
            file_name: String::new(),
            mime: Self::LOG_MIME,
            bytes: Vec::new(),
        }
    }
}

/// Field set submitted to the destination's upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    /// Destination form key, present for session uploads.
    pub auth: Option<String>,
    /// Upload category, `0` for music.
    pub category: u8,
    /// Artist names in role order.
    pub artists: Vec<String>,
    /// Role weight per artist, same length as `artists`.
    pub importance: Vec<u8>,
    /// Release title.
    pub title: String,
    /// Original release year.
    pub year: u32,
    /// Release-type code in the destination taxonomy.
    pub release_type: u32,
    /// Audio format.
    pub format: String,
    /// Source media.
    pub media: String,
    /// Encoding / bitrate.
    pub bitrate: String,
    /// Album description.
    pub album_description: String,
    /// Release description.
    pub release_description: String,
    /// Comma-joined tags.
    pub tags: String,
    /// Cover image URL.
    pub image: String,
    /// Remaster year after fallback.
    pub remaster_year: u32,
    /// Remaster record label after fallback.
    pub remaster_record_label: String,
    /// Remaster catalogue number after fallback.
    pub remaster_catalogue_number: String,
    /// Remaster title, no fallback.
    pub remaster_title: String,
    /// Scene flag.
    pub scene: bool,
    /// The generated torrent.
    pub torrent: Attachment,
    /// Rip logs.
    pub logs: Vec<Attachment>,
}

impl UploadPayload {
    /// Text fields in form order; repeated keys are emitted once per value.
    #[must_use]
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(24 + self.artists.len() * 2);
        if let Some(auth) = &self.auth {
            fields.push(("auth", auth.clone()));
        }
        fields.push(("type", self.category.to_string()));
        for (artist, weight) in self.artists.iter().zip(&self.importance) {
            fields.push(("artists[]", artist.clone()));
            fields.push(("importance[]", weight.to_string()));
        }
        fields.push(("title", self.title.clone()));
        fields.push(("year", self.year.to_string()));
        fields.push(("releasetype", self.release_type.to_string()));
        fields.push(("format", self.format.clone()));
        fields.push(("media", self.media.clone()));
        fields.push(("bitrate", self.bitrate.clone()));
        fields.push(("album_desc", self.album_description.clone()));
        fields.push(("release_desc", self.release_description.clone()));
        fields.push(("tags", self.tags.clone()));
        fields.push(("image", self.image.clone()));
        fields.push(("remaster", "on".to_string()));
        fields.push(("remaster_year", self.remaster_year.to_string()));
        fields.push(("remaster_record_label", self.remaster_record_label.clone()));
        fields.push((
            "remaster_catalogue_number",
            self.remaster_catalogue_number.clone(),
        ));
        fields.push(("remaster_title", self.remaster_title.clone()));
        if self.scene {
            fields.push(("scene", "on".to_string()));
        }
        fields.push(("submit", "true".to_string()));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(base_url: &str) -> TrackerEndpoint {
        TrackerEndpoint {
            base_url: base_url.to_string(),
            announce_host: "flacsfor.me".to_string(),
            acronym: "RED".to_string(),
            credential: Credential::SessionCookie("session=abc".to_string()),
            taxonomy: Taxonomy::Redacted,
            requires_log_field: false,
        }
    }

    #[test]
    fn short_name_keeps_letters_and_dots() {
        assert_eq!(endpoint("https://redacted.sh").short_name(), "redacted.sh");
        assert_eq!(endpoint("http://127.0.0.1:8080").short_name(), "...");
        assert_eq!(endpoint("orpheus.network").short_name(), "orpheus.network");
    }

    #[test]
    fn announce_url_embeds_passkey() {
        assert_eq!(
            endpoint("https://redacted.sh").announce_url("pk"),
            "https://flacsfor.me/pk/announce"
        );
    }

    #[test]
    fn credential_debug_is_redacted() {
        let rendered = format!("{:?}", Credential::ApiKey("secret".to_string()));
        assert!(!rendered.contains("secret"));
        assert!(!Credential::SessionCookie("  ".to_string()).is_present());
    }

    #[test]
    fn log_files_are_filtered_by_extension() {
        let record = SourceReleaseRecord {
            file_list: vec![
                FileEntry {
                    path: "01 - Intro.flac".to_string(),
                    size: 10,
                },
                FileEntry {
                    path: "Rip.LOG".to_string(),
                    size: 2,
                },
                FileEntry {
                    path: "CD2/rip.log".to_string(),
                    size: 2,
                },
            ],
            ..SourceReleaseRecord::default()
        };
        assert_eq!(record.log_files(), vec!["Rip.LOG", "CD2/rip.log"]);
    }

    #[test]
    fn relocate_copies_then_removes_original() -> Result<(), Box<dyn std::error::Error>> {
        let work = tempfile::tempdir()?;
        let target = tempfile::tempdir()?;
        let original = work.path().join("Album-redacted.sh.torrent");
        fs::write(&original, b"d4:infod4:name1:aee")?;

        let generated = GeneratedTorrentFile::claim(&original)?;
        let moved = generated.relocate(target.path())?;

        assert!(!original.exists());
        assert_eq!(moved, target.path().join("Album-redacted.sh.torrent"));
        assert_eq!(fs::read(&moved)?, b"d4:infod4:name1:aee");
        Ok(())
    }

    #[test]
    fn claim_rejects_missing_files() {
        let err = GeneratedTorrentFile::claim("/definitely/missing.torrent")
            .expect_err("missing file must not be claimed");
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn text_fields_pair_artists_with_weights() {
        let payload = UploadPayload {
            auth: Some("ak".to_string()),
            category: 0,
            artists: vec!["A".to_string(), "B".to_string()],
            importance: vec![1, 2],
            title: "T".to_string(),
            year: 2001,
            release_type: 1,
            format: "FLAC".to_string(),
            media: "CD".to_string(),
            bitrate: "Lossless".to_string(),
            album_description: String::new(),
            release_description: String::new(),
            tags: "rock".to_string(),
            image: String::new(),
            remaster_year: 2001,
            remaster_record_label: String::new(),
            remaster_catalogue_number: String::new(),
            remaster_title: String::new(),
            scene: true,
            torrent: Attachment::empty_log(),
            logs: Vec::new(),
        };
        let fields = payload.text_fields();
        let artists: Vec<_> = fields
            .iter()
            .filter(|(key, _)| *key == "artists[]" || *key == "importance[]")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(artists, vec!["A", "1", "B", "2"]);
        assert!(fields.contains(&("scene", "on".to_string())));
        assert!(fields.contains(&("auth", "ak".to_string())));
    }
}
