//! Reads the YAML document and applies environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{CurryConfig, TrackerConfig};
use crate::validate::validate;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "CURRY_CONFIG";
/// Configuration file used when nothing else is given.
pub const DEFAULT_CONFIG_PATH: &str = "./curry.yaml";

const SOURCE_COOKIE_ENV: &str = "CURRY_SOURCE_COOKIE";
const SOURCE_API_KEY_ENV: &str = "CURRY_SOURCE_API_KEY";
const TARGET_COOKIE_ENV: &str = "CURRY_TARGET_COOKIE";
const TARGET_API_KEY_ENV: &str = "CURRY_TARGET_API_KEY";

/// Resolve the configuration path: explicit flag, then `CURRY_CONFIG`, then
/// `./curry.yaml`.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(
        || {
            std::env::var_os(CONFIG_PATH_ENV)
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
        },
        Path::to_path_buf,
    )
}

/// Load and validate configuration using the process environment.
///
/// # Errors
///
/// See [`load_with`].
pub fn load(path: &Path) -> ConfigResult<CurryConfig> {
    load_with(path, |name| std::env::var(name).ok())
}

/// Load and validate configuration, reading overrides through `env`.
///
/// Relative `cookie_file` paths are resolved against the configuration
/// file's folder.
///
/// # Errors
///
/// `Io` when the file or a cookie file cannot be read, `Parse` for malformed
/// YAML, and validation errors from [`validate`].
pub fn load_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> ConfigResult<CurryConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "read_config",
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: CurryConfig =
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    apply_overrides(&mut config.source, &env, SOURCE_COOKIE_ENV, SOURCE_API_KEY_ENV);
    apply_overrides(&mut config.target, &env, TARGET_COOKIE_ENV, TARGET_API_KEY_ENV);
    read_cookie_file(&mut config.source, base)?;
    read_cookie_file(&mut config.target, base)?;

    validate(&config)?;
    info!(
        path = %path.display(),
        source = %config.source.acronym,
        target = %config.target.acronym,
        "configuration loaded"
    );
    Ok(config)
}

fn apply_overrides(
    tracker: &mut TrackerConfig,
    env: &impl Fn(&str) -> Option<String>,
    cookie_var: &str,
    api_key_var: &str,
) {
    if let Some(cookie) = env(cookie_var).filter(|value| !value.trim().is_empty()) {
        debug!(variable = cookie_var, "cookie taken from environment");
        tracker.cookie = Some(cookie);
    }
    if let Some(api_key) = env(api_key_var).filter(|value| !value.trim().is_empty()) {
        debug!(variable = api_key_var, "api key taken from environment");
        tracker.api_key = Some(api_key);
    }
}

fn read_cookie_file(tracker: &mut TrackerConfig, base: &Path) -> ConfigResult<()> {
    let has_cookie = tracker
        .cookie
        .as_deref()
        .is_some_and(|value| !value.trim().is_empty());
    let Some(file) = tracker.cookie_file.as_ref().filter(|_| !has_cookie) else {
        return Ok(());
    };
    let path = if file.is_absolute() {
        file.clone()
    } else {
        base.join(file)
    };
    let cookie = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        operation: "read_cookie_file",
        path: path.clone(),
        source,
    })?;
    tracker.cookie = Some(cookie.trim().to_string());
    Ok(())
}
