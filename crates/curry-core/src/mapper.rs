//! Translation of a source release into the destination's upload field set.

use tracing::debug;

use crate::error::{MigrationError, MigrationResult};
use crate::model::{
    ArtistRole, Attachment, Credential, GeneratedTorrentFile, ReleaseGroup, SourceReleaseRecord,
    TrackerEndpoint, UploadPayload,
};

const MUSIC_CATEGORY: u8 = 0;

/// Builds [`UploadPayload`]s for one source/destination pair.
#[derive(Debug, Clone)]
pub struct MetadataMapper {
    source: TrackerEndpoint,
    destination: TrackerEndpoint,
    source_user_id: u64,
}

impl MetadataMapper {
    /// Create a mapper; `source_user_id` is the running user's id on the source.
    #[must_use]
    pub fn new(source: TrackerEndpoint, destination: TrackerEndpoint, source_user_id: u64) -> Self {
        Self {
            source,
            destination,
            source_user_id,
        }
    }

    /// Refuse releases whose descriptions already mention the destination.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyMigrated` when the destination acronym appears in the
    /// torrent or group description.
    pub fn guard_self_repost(&self, record: &SourceReleaseRecord) -> MigrationResult<()> {
        if record.descriptions_contain(&self.destination.acronym) {
            return Err(MigrationError::already_migrated(format!(
                "description already mentions {}",
                self.destination.acronym
            ))
            .with_tracker(self.destination.acronym.clone()));
        }
        Ok(())
    }

    /// Build the upload payload for `record`.
    ///
    /// `torrent` must already exist on disk; `destination_authkey` is only
    /// embedded for session-authenticated destinations.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyMigrated` when the self-repost guard trips and `Io` when
    /// the generated torrent cannot be read.
    pub fn map(
        &self,
        record: &SourceReleaseRecord,
        torrent: &GeneratedTorrentFile,
        logs: Vec<Attachment>,
        destination_authkey: &str,
    ) -> MigrationResult<UploadPayload> {
        self.guard_self_repost(record)?;

        let group = &record.group;
        let (artists, importance) = artist_credits(group);
        let release_type = self
            .source
            .taxonomy
            .translate(group.release_type, self.destination.taxonomy);
        debug!(
            source_release_type = group.release_type,
            release_type, "translated release type"
        );

        let auth = match self.destination.credential {
            Credential::SessionCookie(_) => Some(destination_authkey.to_string()),
            Credential::ApiKey(_) => None,
        };

        Ok(UploadPayload {
            auth,
            category: MUSIC_CATEGORY,
            artists,
            importance,
            title: group.name.clone(),
            year: group.year,
            release_type,
            format: record.format.clone(),
            media: record.media.clone(),
            bitrate: record.encoding.clone(),
            album_description: group.description.clone(),
            release_description: self.release_description(record),
            tags: group.tags.join(","),
            image: group.wiki_image.clone(),
            remaster_year: remaster_year(record),
            remaster_record_label: fallback(&record.remaster_record_label, &group.record_label),
            remaster_catalogue_number: fallback(
                &record.remaster_catalogue_number,
                &group.catalogue_number,
            ),
            remaster_title: record.remaster_title.clone(),
            scene: record.scene,
            torrent: torrent.to_attachment()?,
            logs,
        })
    }

    fn release_description(&self, record: &SourceReleaseRecord) -> String {
        let source_page = self.source.torrent_page(record.torrent_id);
        let uploader = if record.uploader_id == self.source_user_id {
            "my".to_string()
        } else {
            format!("{}'s", record.uploader_name)
        };
        format!(
            "[align=center][url={source_page}]{} [b]\u{27f9}[/b] {}[/url]\n\
             [size=1]cross-post of [url={}/user.php?id={}]{uploader}[/url] {} \
             [url={source_page}]upload[/url][/size][/align]\n{}",
            self.source.acronym,
            self.destination.acronym,
            self.source.base_url,
            record.uploader_id,
            self.source.acronym,
            record.description,
        )
    }
}

/// Flatten role-keyed credits into parallel name and weight lists.
fn artist_credits(group: &ReleaseGroup) -> (Vec<String>, Vec<u8>) {
    let mut names = Vec::new();
    let mut weights = Vec::new();
    for role in ArtistRole::ALL {
        for name in group.artists.get(&role).into_iter().flatten() {
            names.push(name.clone());
            weights.push(role.weight());
        }
    }
    (names, weights)
}

const fn remaster_year(record: &SourceReleaseRecord) -> u32 {
    if record.remaster_year == 0 {
        record.group.year
    } else {
        record.remaster_year
    }
}

fn fallback(value: &str, original: &str) -> String {
    if value.trim().is_empty() {
        original.to_string()
    } else {
        value.to_string()
    }
}
