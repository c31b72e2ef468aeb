//! Typed configuration document.

use std::path::PathBuf;
use std::time::Duration;

use curry_core::{Credential, Taxonomy, TrackerEndpoint};
use serde::Deserialize;

use crate::defaults::{default_http_timeout_secs, default_rewrite_source_tag, default_work_dir};
use crate::error::{ConfigError, ConfigResult};

/// Immutable run configuration, built once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurryConfig {
    /// Root folder holding the seeded release folders.
    pub seeding_folder: PathBuf,
    /// Folder finished torrents are moved to for single-reference runs.
    #[serde(default)]
    pub torrent_folder: Option<PathBuf>,
    /// Folder generated torrents are written to before they are moved.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Per-request HTTP timeout.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Replace `info.source` when patching a downloaded torrent.
    #[serde(default = "default_rewrite_source_tag")]
    pub rewrite_source_tag: bool,
    /// Tracker releases are taken from.
    pub source: TrackerConfig,
    /// Tracker releases are uploaded to.
    pub target: TrackerConfig,
}

impl CurryConfig {
    /// HTTP timeout as a [`Duration`].
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Source tracker endpoint.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` when no credential is configured.
    pub fn source_endpoint(&self) -> ConfigResult<TrackerEndpoint> {
        self.source.endpoint("source")
    }

    /// Destination tracker endpoint.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` when no credential is configured.
    pub fn target_endpoint(&self) -> ConfigResult<TrackerEndpoint> {
        self.target.endpoint("target")
    }
}

/// Per-tracker settings.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Web base URL, e.g. `https://redacted.sh`.
    pub url: String,
    /// Host embedded in announce URLs.
    pub announce_host: String,
    /// Short tracker acronym.
    pub acronym: String,
    /// Session cookie header value.
    #[serde(default)]
    pub cookie: Option<String>,
    /// File holding the session cookie; read at load time.
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
    /// API key; preferred over the cookie when both are set.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Release-type taxonomy, inferred from the acronym when absent.
    #[serde(default)]
    pub taxonomy: Option<Taxonomy>,
    /// Whether uploads must always carry a log field.
    #[serde(default)]
    pub requires_log_field: bool,
}

impl TrackerConfig {
    /// Credential chosen for this tracker: API key first, then cookie.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        present(&self.api_key)
            .map(Credential::ApiKey)
            .or_else(|| present(&self.cookie).map(Credential::SessionCookie))
    }

    /// Taxonomy in effect for this tracker.
    #[must_use]
    pub fn taxonomy(&self) -> Taxonomy {
        self.taxonomy
            .unwrap_or_else(|| Taxonomy::from_acronym(&self.acronym))
    }

    fn endpoint(&self, section: &'static str) -> ConfigResult<TrackerEndpoint> {
        let credential = self
            .credential()
            .ok_or(ConfigError::MissingCredential { section })?;
        Ok(TrackerEndpoint {
            base_url: self.url.trim_end_matches('/').to_string(),
            announce_host: self.announce_host.clone(),
            acronym: self.acronym.clone(),
            credential,
            taxonomy: self.taxonomy(),
            requires_log_field: self.requires_log_field,
        })
    }
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TrackerConfig")
            .field("url", &self.url)
            .field("announce_host", &self.announce_host)
            .field("acronym", &self.acronym)
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .field("cookie_file", &self.cookie_file)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("taxonomy", &self.taxonomy)
            .field("requires_log_field", &self.requires_log_field)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(cookie: Option<&str>, api_key: Option<&str>) -> TrackerConfig {
        TrackerConfig {
            url: "https://orpheus.network/".to_string(),
            announce_host: "home.opsfet.ch".to_string(),
            acronym: "OPS".to_string(),
            cookie: cookie.map(str::to_string),
            cookie_file: None,
            api_key: api_key.map(str::to_string),
            taxonomy: None,
            requires_log_field: false,
        }
    }

    #[test]
    fn api_key_wins_over_cookie() {
        assert_eq!(
            tracker(Some("c"), Some("k")).credential(),
            Some(Credential::ApiKey("k".to_string()))
        );
        assert_eq!(
            tracker(Some("c"), Some("  ")).credential(),
            Some(Credential::SessionCookie("c".to_string()))
        );
        assert_eq!(tracker(None, None).credential(), None);
    }

    #[test]
    fn endpoint_normalises_url_and_infers_taxonomy() {
        let endpoint = tracker(Some("c"), None)
            .endpoint("source")
            .expect("credential present");
        assert_eq!(endpoint.base_url, "https://orpheus.network");
        assert_eq!(endpoint.taxonomy, Taxonomy::Orpheus);
    }

    #[test]
    fn missing_credential_names_the_section() {
        let err = tracker(None, None)
            .endpoint("target")
            .expect_err("no credential");
        assert!(matches!(err, ConfigError::MissingCredential { section: "target" }));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", tracker(Some("session=secret"), Some("key")));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
