//! Release-type taxonomies and the translation rules between them.
//!
//! The two full taxonomies share most codes. Translation between them is a
//! pair of fixed lookup tables; codes missing from a table collapse onto the
//! destination's default code. The tables are not a bijection: Orpheus `8`
//! (Spokenword) and `12` (Audiobook) both land on Redacted `21` (Unknown), so
//! they cannot survive a round trip.
//!
//! The condensed taxonomy only has three buckets and is derived from the
//! source code alone.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A tracker's release-type classification scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Taxonomy {
    /// Redacted-style codes.
    Redacted,
    /// Orpheus-style codes.
    Orpheus,
    /// Three buckets: album, single/EP, other.
    Condensed,
}

const ORPHEUS_TO_REDACTED: [(u32, u32); 17] = [
    (1, 1),
    (3, 3),
    (5, 5),
    (6, 6),
    (7, 7),
    (8, 21),
    (9, 9),
    (10, 17),
    (11, 11),
    (12, 21),
    (13, 13),
    (14, 14),
    (15, 15),
    (16, 16),
    (17, 19),
    (18, 18),
    (21, 21),
];

const REDACTED_TO_ORPHEUS: [(u32, u32); 15] = [
    (1, 1),
    (3, 3),
    (5, 5),
    (6, 6),
    (7, 7),
    (9, 9),
    (11, 11),
    (13, 13),
    (14, 14),
    (15, 15),
    (16, 16),
    (17, 10),
    (18, 18),
    (19, 17),
    (21, 21),
];

const CONDENSED_ALBUM: u32 = 1;
const CONDENSED_SHORT: u32 = 2;
const CONDENSED_OTHER: u32 = 3;

const FULL_ALBUM: u32 = 1;
const FULL_EP: u32 = 5;
const FULL_SINGLE: u32 = 9;
const FULL_UNKNOWN: u32 = 21;

impl Taxonomy {
    /// Guess the taxonomy from a tracker acronym.
    #[must_use]
    pub fn from_acronym(acronym: &str) -> Self {
        if acronym.eq_ignore_ascii_case("OPS") {
            Self::Orpheus
        } else {
            Self::Redacted
        }
    }

    /// Code used when a source code has no counterpart.
    #[must_use]
    pub const fn default_code(self) -> u32 {
        match self {
            Self::Redacted | Self::Orpheus => FULL_UNKNOWN,
            Self::Condensed => CONDENSED_OTHER,
        }
    }

    /// Translate `code` from this taxonomy into `destination`.
    ///
    /// Never returns an unmapped value: anything without a counterpart becomes
    /// `destination.default_code()`.
    #[must_use]
    pub fn translate(self, code: u32, destination: Self) -> u32 {
        match (self, destination) {
            (Self::Redacted, Self::Redacted) | (Self::Orpheus, Self::Orpheus) => code,
            (Self::Orpheus, Self::Redacted) => lookup(&ORPHEUS_TO_REDACTED, code, destination),
            (Self::Redacted, Self::Orpheus) => lookup(&REDACTED_TO_ORPHEUS, code, destination),
            (Self::Condensed, Self::Condensed) => match code {
                CONDENSED_ALBUM | CONDENSED_SHORT => code,
                _ => CONDENSED_OTHER,
            },
            (_, Self::Condensed) => condensed_bucket(code),
            (Self::Condensed, Self::Redacted | Self::Orpheus) => match code {
                CONDENSED_ALBUM => FULL_ALBUM,
                CONDENSED_SHORT => FULL_EP,
                _ => destination.default_code(),
            },
        }
    }
}

impl FromStr for Taxonomy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redacted" => Ok(Self::Redacted),
            "orpheus" => Ok(Self::Orpheus),
            "condensed" => Ok(Self::Condensed),
            other => Err(format!("unknown taxonomy '{other}'")),
        }
    }
}

fn lookup(table: &[(u32, u32)], code: u32, destination: Taxonomy) -> u32 {
    table
        .iter()
        .find_map(|&(from, to)| (from == code).then_some(to))
        .unwrap_or_else(|| destination.default_code())
}

const fn condensed_bucket(code: u32) -> u32 {
    match code {
        FULL_ALBUM => CONDENSED_ALBUM,
        FULL_EP | FULL_SINGLE => CONDENSED_SHORT,
        _ => CONDENSED_OTHER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_codes_round_trip() {
        for &(code, _) in &ORPHEUS_TO_REDACTED {
            if matches!(code, 8 | 12) {
                continue;
            }
            let there = Taxonomy::Orpheus.translate(code, Taxonomy::Redacted);
            let back = Taxonomy::Redacted.translate(there, Taxonomy::Orpheus);
            assert_eq!(back, code, "orpheus code {code} did not round trip");
        }
        for &(code, _) in &REDACTED_TO_ORPHEUS {
            let there = Taxonomy::Redacted.translate(code, Taxonomy::Orpheus);
            let back = Taxonomy::Orpheus.translate(there, Taxonomy::Redacted);
            assert_eq!(back, code, "redacted code {code} did not round trip");
        }
    }

    #[test]
    fn spokenword_and_audiobook_collapse_onto_unknown() {
        assert_eq!(Taxonomy::Orpheus.translate(8, Taxonomy::Redacted), 21);
        assert_eq!(Taxonomy::Orpheus.translate(12, Taxonomy::Redacted), 21);
        assert_eq!(Taxonomy::Redacted.translate(21, Taxonomy::Orpheus), 21);
    }

    #[test]
    fn renumbered_codes_are_remapped() {
        assert_eq!(Taxonomy::Orpheus.translate(10, Taxonomy::Redacted), 17);
        assert_eq!(Taxonomy::Orpheus.translate(17, Taxonomy::Redacted), 19);
        assert_eq!(Taxonomy::Redacted.translate(17, Taxonomy::Orpheus), 10);
        assert_eq!(Taxonomy::Redacted.translate(19, Taxonomy::Orpheus), 17);
    }

    #[test]
    fn unknown_codes_fall_back_to_default() {
        assert_eq!(Taxonomy::Redacted.translate(2, Taxonomy::Orpheus), 21);
        assert_eq!(Taxonomy::Orpheus.translate(99, Taxonomy::Redacted), 21);
        assert_eq!(Taxonomy::Redacted.translate(99, Taxonomy::Condensed), 3);
    }

    #[test]
    fn same_taxonomy_is_identity() {
        assert_eq!(Taxonomy::Redacted.translate(2, Taxonomy::Redacted), 2);
        assert_eq!(Taxonomy::Orpheus.translate(8, Taxonomy::Orpheus), 8);
    }

    #[test]
    fn condensed_buckets_follow_source_code() {
        for source in [Taxonomy::Redacted, Taxonomy::Orpheus] {
            assert_eq!(source.translate(1, Taxonomy::Condensed), 1);
            assert_eq!(source.translate(5, Taxonomy::Condensed), 2);
            assert_eq!(source.translate(9, Taxonomy::Condensed), 2);
            assert_eq!(source.translate(6, Taxonomy::Condensed), 3);
        }
        assert_eq!(Taxonomy::Condensed.translate(2, Taxonomy::Redacted), 5);
        assert_eq!(Taxonomy::Condensed.translate(3, Taxonomy::Orpheus), 21);
    }

    #[test]
    fn acronym_and_name_parsing() {
        assert_eq!(Taxonomy::from_acronym("ops"), Taxonomy::Orpheus);
        assert_eq!(Taxonomy::from_acronym("RED"), Taxonomy::Redacted);
        assert_eq!("Condensed".parse::<Taxonomy>(), Ok(Taxonomy::Condensed));
        assert!("bogus".parse::<Taxonomy>().is_err());
    }
}
