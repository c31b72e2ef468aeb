//! `.torrent` metainfo: announce matching, info-hash and rebranding.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::bencode::{self, Value};
use crate::error::{TorrentError, TorrentResult};

const ANNOUNCE: &[u8] = b"announce";
const ANNOUNCE_LIST: &[u8] = b"announce-list";
const COMMENT: &[u8] = b"comment";
const INFO: &[u8] = b"info";
const SOURCE: &[u8] = b"source";

/// How a torrent's trackers relate to a given announce host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnounceMatch {
    /// The announce field (or, failing that, an announce-list entry) names the host.
    Matches,
    /// Announce information exists but points elsewhere.
    Elsewhere,
    /// Neither `announce` nor `announce-list` is present.
    Missing,
}

/// A decoded torrent whose `info` dictionary is kept byte-exact until patched.
#[derive(Debug, Clone)]
pub struct Metainfo {
    entries: BTreeMap<Vec<u8>, Value>,
    info_raw: Vec<u8>,
    info_patched: bool,
}

impl Metainfo {
    /// Decode metainfo from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `Decode` for malformed bencode and `MissingField` when there
    /// is no `info` dictionary.
    pub fn from_bytes(bytes: &[u8]) -> TorrentResult<Self> {
        let decoded = bencode::decode_dict_entries(bytes)
            .map_err(|source| TorrentError::Decode { path: None, source })?;
        let mut entries = BTreeMap::new();
        let mut info_raw = None;
        for entry in decoded {
            if entry.key == INFO {
                if entry.value.as_dict().is_none() {
                    return Err(TorrentError::MissingField { field: "info" });
                }
                info_raw = Some(bytes[entry.span.clone()].to_vec());
            }
            entries.insert(entry.key, entry.value);
        }
        let info_raw = info_raw.ok_or(TorrentError::MissingField { field: "info" })?;
        Ok(Self {
            entries,
            info_raw,
            info_patched: false,
        })
    }

    /// Read and decode a torrent file.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be read, otherwise as [`Self::from_bytes`].
    pub fn read(path: &Path) -> TorrentResult<Self> {
        let bytes = fs::read(path).map_err(|source| TorrentError::io("read_torrent", path, source))?;
        Self::from_bytes(&bytes).map_err(|err| match err {
            TorrentError::Decode { source, .. } => TorrentError::Decode {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })
    }

    /// Primary announce URL, if any.
    #[must_use]
    pub fn announce(&self) -> Option<&str> {
        self.entries.get(ANNOUNCE).and_then(Value::as_str)
    }

    /// Every URL in the announce-list tiers, flattened.
    #[must_use]
    pub fn announce_list(&self) -> Vec<&str> {
        self.entries
            .get(ANNOUNCE_LIST)
            .and_then(Value::as_list)
            .into_iter()
            .flatten()
            .flat_map(|tier| match tier {
                Value::List(urls) => urls.iter().filter_map(Value::as_str).collect(),
                other => other.as_str().into_iter().collect::<Vec<_>>(),
            })
            .collect()
    }

    /// Check the torrent's trackers against `host`.
    ///
    /// The single `announce` field decides when present; the announce-list is
    /// only consulted without it.
    #[must_use]
    pub fn announces_to(&self, host: &str) -> AnnounceMatch {
        if let Some(announce) = self.announce() {
            return if announce.contains(host) {
                AnnounceMatch::Matches
            } else {
                AnnounceMatch::Elsewhere
            };
        }
        if !self.entries.contains_key(ANNOUNCE_LIST) {
            return AnnounceMatch::Missing;
        }
        if self.announce_list().iter().any(|url| url.contains(host)) {
            AnnounceMatch::Matches
        } else {
            AnnounceMatch::Elsewhere
        }
    }

    /// `info.name`, when present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.info()
            .and_then(|info| info.get(b"name".as_slice()))
            .and_then(Value::as_str)
    }

    /// `info.source`, when present.
    #[must_use]
    pub fn source_tag(&self) -> Option<&str> {
        self.info()
            .and_then(|info| info.get(SOURCE))
            .and_then(Value::as_str)
    }

    /// `comment`, when present.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.entries.get(COMMENT).and_then(Value::as_str)
    }

    /// Upper-case hex SHA-1 of the encoded `info` dictionary.
    #[must_use]
    pub fn info_hash(&self) -> String {
        hex::encode_upper(Sha1::digest(self.info_bytes()))
    }

    /// Point the torrent at another tracker.
    ///
    /// Replaces `announce` and `comment` and drops `announce-list`. With
    /// `rewrite_source_tag` the `info.source` field is replaced too, which
    /// changes the info-hash; without it `info` stays byte-exact.
    pub fn rebrand(&mut self, announce: &str, comment: &str, source_tag: &str, rewrite_source_tag: bool) {
        self.entries.insert(ANNOUNCE.to_vec(), Value::text(announce));
        self.entries.insert(COMMENT.to_vec(), Value::text(comment));
        self.entries.remove(ANNOUNCE_LIST);
        if rewrite_source_tag
            && let Some(Value::Dict(info)) = self.entries.get_mut(INFO)
        {
            info.insert(SOURCE.to_vec(), Value::text(source_tag));
            self.info_patched = true;
        }
    }

    /// Encode the torrent, emitting an untouched `info` verbatim.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![b'd'];
        for (key, value) in &self.entries {
            bencode::encode_bytes(key, &mut out);
            if key == INFO && !self.info_patched {
                out.extend_from_slice(&self.info_raw);
            } else {
                bencode::encode_into(value, &mut out);
            }
        }
        out.push(b'e');
        out
    }

    fn info(&self) -> Option<&BTreeMap<Vec<u8>, Value>> {
        self.entries.get(INFO).and_then(Value::as_dict)
    }

    fn info_bytes(&self) -> Vec<u8> {
        if self.info_patched {
            self.entries
                .get(INFO)
                .map(bencode::encode)
                .unwrap_or_default()
        } else {
            self.info_raw.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &[u8] =
        b"d8:announce35:https://home.opsfet.ch/abc/announce4:infod6:lengthi5e4:name5:Album6:source3:OPSee";

    fn with_list_only() -> Vec<u8> {
        b"d13:announce-listll30:https://a.example/one/announceel31:https://flacsfor.me/pk/announceee4:infod4:name1:xee"
            .to_vec()
    }

    #[test]
    fn announce_field_decides_the_match() {
        let meta = Metainfo::from_bytes(SINGLE).expect("decode");
        assert_eq!(meta.announces_to("opsfet.ch"), AnnounceMatch::Matches);
        assert_eq!(meta.announces_to("flacsfor.me"), AnnounceMatch::Elsewhere);
    }

    #[test]
    fn announce_list_is_searched_without_announce() {
        let meta = Metainfo::from_bytes(&with_list_only()).expect("decode");
        assert_eq!(meta.announces_to("flacsfor.me"), AnnounceMatch::Matches);
        assert_eq!(meta.announces_to("opsfet.ch"), AnnounceMatch::Elsewhere);
        let bare = Metainfo::from_bytes(b"d4:infod4:name1:xee").expect("decode");
        assert_eq!(bare.announces_to("opsfet.ch"), AnnounceMatch::Missing);
    }

    #[test]
    fn info_hash_covers_the_raw_info_dictionary() {
        let meta = Metainfo::from_bytes(SINGLE).expect("decode");
        let expected = hex::encode_upper(Sha1::digest(b"d6:lengthi5e4:name5:Album6:source3:OPSe"));
        assert_eq!(meta.info_hash(), expected);
        assert_eq!(meta.info_hash().len(), 40);
    }

    #[test]
    fn non_canonical_info_is_preserved_when_untouched() {
        let input = b"d8:announce3:old4:infod4:name1:x6:lengthi1eee";
        let mut meta = Metainfo::from_bytes(input).expect("decode");
        let before = meta.info_hash();
        meta.rebrand("https://flacsfor.me/pk/announce", "https://redacted.sh", "RED", false);
        let encoded = meta.to_bytes();
        assert!(
            encoded
                .windows(21)
                .any(|window| window == b"d4:name1:x6:lengthi1e")
        );
        assert_eq!(Metainfo::from_bytes(&encoded).expect("decode").info_hash(), before);
    }

    #[test]
    fn rebrand_rewrites_tracker_fields() {
        let mut meta = Metainfo::from_bytes(&with_list_only()).expect("decode");
        meta.rebrand("https://flacsfor.me/pk/announce", "https://redacted.sh", "RED", true);
        let reparsed = Metainfo::from_bytes(&meta.to_bytes()).expect("decode");
        assert_eq!(reparsed.announce(), Some("https://flacsfor.me/pk/announce"));
        assert_eq!(reparsed.comment(), Some("https://redacted.sh"));
        assert_eq!(reparsed.source_tag(), Some("RED"));
        assert!(reparsed.announce_list().is_empty());
        assert_eq!(reparsed.name(), Some("x"));
    }

    #[test]
    fn missing_info_is_rejected() {
        assert!(matches!(
            Metainfo::from_bytes(b"d8:announce1:ae"),
            Err(TorrentError::MissingField { field: "info" })
        ));
    }
}
