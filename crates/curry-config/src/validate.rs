//! Validation of a loaded configuration document.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{CurryConfig, TrackerConfig};

/// Check every field that later stages rely on.
///
/// # Errors
///
/// Returns the first `InvalidField` or `MissingCredential` found.
pub fn validate(config: &CurryConfig) -> ConfigResult<()> {
    if config.seeding_folder.as_os_str().is_empty() {
        return Err(invalid("root", "seeding_folder", None, "must not be empty"));
    }
    if config.http_timeout_secs == 0 {
        return Err(invalid(
            "root",
            "http_timeout_secs",
            Some(config.http_timeout_secs.to_string()),
            "must be greater than zero",
        ));
    }
    validate_tracker("source", &config.source)?;
    validate_tracker("target", &config.target)?;
    if config.source.url.trim_end_matches('/') == config.target.url.trim_end_matches('/') {
        return Err(invalid(
            "target",
            "url",
            Some(config.target.url.clone()),
            "must differ from the source url",
        ));
    }
    Ok(())
}

fn validate_tracker(section: &'static str, tracker: &TrackerConfig) -> ConfigResult<()> {
    let url = Url::parse(&tracker.url)
        .map_err(|_| invalid(section, "url", Some(tracker.url.clone()), "must be an absolute URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            section,
            "url",
            Some(tracker.url.clone()),
            "must use http or https",
        ));
    }
    if tracker.announce_host.trim().is_empty() {
        return Err(invalid(section, "announce_host", None, "must not be empty"));
    }
    if tracker.acronym.trim().is_empty() {
        return Err(invalid(section, "acronym", None, "must not be empty"));
    }
    if tracker.credential().is_none() {
        return Err(ConfigError::MissingCredential { section });
    }
    Ok(())
}

fn invalid(
    section: &'static str,
    field: &'static str,
    value: Option<String>,
    reason: &'static str,
) -> ConfigError {
    ConfigError::InvalidField {
        section,
        field,
        value,
        reason,
    }
}
