//! Serde defaults for optional configuration fields.

use std::path::PathBuf;

pub(crate) fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

pub(crate) const fn default_http_timeout_secs() -> u64 {
    30
}

pub(crate) const fn default_rewrite_source_tag() -> bool {
    true
}
