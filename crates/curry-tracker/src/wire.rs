//! Gazelle JSON payloads and their conversion into domain records.

use std::collections::BTreeMap;

use curry_core::{ArtistRole, FileEntry, ReleaseGroup, SourceReleaseRecord};
use serde::Deserialize;

const LEFT_TO_RIGHT_MARK: char = '\u{200e}';

/// Standard `{status, response | error}` envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// `success` or `failure`.
    pub status: String,
    /// Payload on success.
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    /// Message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// Whether the server reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

/// `action=torrent` response.
#[derive(Debug, Deserialize)]
pub struct TorrentResponse {
    group: WireGroup,
    torrent: WireTorrent,
}

// Gazelle sends `null` for unset values, so every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireGroup {
    name: Option<String>,
    year: Option<u32>,
    record_label: Option<String>,
    catalogue_number: Option<String>,
    release_type: Option<u32>,
    tags: Option<Vec<String>>,
    bb_body: Option<String>,
    #[serde(rename = "wikiBBcode")]
    wiki_bbcode: Option<String>,
    wiki_body: Option<String>,
    wiki_image: Option<String>,
    music_info: Option<BTreeMap<String, Option<Vec<WireArtist>>>>,
}

#[derive(Debug, Deserialize)]
struct WireArtist {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireTorrent {
    id: u64,
    info_hash: Option<String>,
    media: Option<String>,
    format: Option<String>,
    encoding: Option<String>,
    remaster_year: Option<u32>,
    remaster_title: Option<String>,
    remaster_record_label: Option<String>,
    remaster_catalogue_number: Option<String>,
    scene: Option<bool>,
    has_log: Option<bool>,
    description: Option<String>,
    file_list: Option<String>,
    file_path: Option<String>,
    user_id: Option<u64>,
    username: Option<String>,
}

impl TorrentResponse {
    /// Convert into a decoded, immutable record.
    #[must_use]
    pub fn into_record(self) -> SourceReleaseRecord {
        let Self { group, torrent } = self;
        let description = [&group.bb_body, &group.wiki_bbcode, &group.wiki_body]
            .into_iter()
            .flatten()
            .find(|body| !body.trim().is_empty())
            .cloned()
            .unwrap_or_default();
        let mut artists = BTreeMap::new();
        if let Some(mut music_info) = group.music_info {
            for role in ArtistRole::ALL {
                let names: Vec<String> = music_info
                    .remove(role.wire_key())
                    .flatten()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|artist| decode(&artist.name))
                    .collect();
                if !names.is_empty() {
                    artists.insert(role, names);
                }
            }
        }
        SourceReleaseRecord {
            torrent_id: torrent.id,
            info_hash: torrent.info_hash.unwrap_or_default().to_ascii_uppercase(),
            file_path: decode_path(torrent.file_path.as_deref().unwrap_or_default()),
            uploader_id: torrent.user_id.unwrap_or_default(),
            uploader_name: decode_opt(torrent.username.as_deref()),
            format: torrent.format.unwrap_or_default(),
            media: torrent.media.unwrap_or_default(),
            encoding: torrent.encoding.unwrap_or_default(),
            has_log: torrent.has_log.unwrap_or_default(),
            file_list: parse_file_list(torrent.file_list.as_deref().unwrap_or_default()),
            remaster_year: torrent.remaster_year.unwrap_or(0),
            remaster_record_label: decode_opt(torrent.remaster_record_label.as_deref()),
            remaster_catalogue_number: decode_opt(torrent.remaster_catalogue_number.as_deref()),
            remaster_title: decode_opt(torrent.remaster_title.as_deref()),
            scene: torrent.scene.unwrap_or_default(),
            description: decode_opt(torrent.description.as_deref()),
            group: ReleaseGroup {
                name: decode_opt(group.name.as_deref()),
                year: group.year.unwrap_or_default(),
                record_label: decode_opt(group.record_label.as_deref()),
                catalogue_number: decode_opt(group.catalogue_number.as_deref()),
                release_type: group.release_type.unwrap_or_default(),
                tags: group.tags.unwrap_or_default(),
                description,
                wiki_image: group.wiki_image.unwrap_or_default(),
                artists,
            },
        }
    }
}

/// Parse `name{{{size}}}|||name{{{size}}}` into file entries.
#[must_use]
pub fn parse_file_list(raw: &str) -> Vec<FileEntry> {
    raw.split("|||")
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, size) = item
                .strip_suffix("}}}")
                .and_then(|rest| rest.rsplit_once("{{{"))
                .map_or((item, 0), |(name, size)| (name, size.parse().unwrap_or(0)));
            FileEntry {
                path: decode_path(name),
                size,
            }
        })
        .collect()
}

fn decode(value: &str) -> String {
    html_escape::decode_html_entities(value).into_owned()
}

fn decode_opt(value: Option<&str>) -> String {
    value.map(decode).unwrap_or_default()
}

fn decode_path(value: &str) -> String {
    decode(value).replace(LEFT_TO_RIGHT_MARK, "")
}
