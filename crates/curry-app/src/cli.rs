//! Command-line surface of the `curry` binary.

use std::path::PathBuf;

use clap::Parser;
use curry_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};

use crate::bootstrap::{RunOptions, run};
use crate::error::{AppError, AppResult};
use crate::orchestrator::BatchReport;

const BUILD_SHA: &str = match option_env!("CURRY_BUILD_SHA") {
    Some(sha) => sha,
    None => "dev",
};

/// Migrate releases from one Gazelle tracker to another.
#[derive(Debug, Parser)]
#[command(name = "curry", version, about)]
pub struct Cli {
    /// Configuration file.
    #[arg(long, env = curry_config::CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,
    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
    /// Log output format: `pretty` or `json`.
    #[arg(long)]
    pub log_format: Option<LogFormat>,
    /// Do not hash local content; patch the source torrent instead.
    #[arg(long)]
    pub no_hasher: bool,
    /// Fetch, generate and map, but do not upload.
    #[arg(long)]
    pub dry_run: bool,
    /// Source torrent URL, torrent id, or a folder of source `.torrent` files.
    pub input: String,
}

impl Cli {
    /// Log format: the flag when given, otherwise the build default.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(LogFormat::infer)
    }

    /// Options for [`crate::run`].
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            config_path: self.config.clone(),
            input: self.input.clone(),
            no_hasher: self.no_hasher,
            dry_run: self.dry_run,
        }
    }
}

/// Install logging and run the migration described by `cli`.
///
/// # Errors
///
/// `Telemetry` when the subscriber cannot be installed, otherwise the errors
/// of [`run`].
pub async fn execute(cli: Cli) -> AppResult<BatchReport> {
    init_logging(&LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format(),
        build_sha: BUILD_SHA,
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    run(cli.run_options()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_input() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "curry",
            "--config",
            "/etc/curry.yaml",
            "--log-format",
            "json",
            "--no-hasher",
            "--dry-run",
            "https://orpheus.network/torrents.php?torrentid=5",
        ])?;
        assert_eq!(cli.log_format(), LogFormat::Json);
        let options = cli.run_options();
        assert_eq!(options.config_path, Some(PathBuf::from("/etc/curry.yaml")));
        assert!(options.no_hasher);
        assert!(options.dry_run);
        assert_eq!(options.input, "https://orpheus.network/torrents.php?torrentid=5");
        Ok(())
    }

    #[test]
    fn input_is_required_and_formats_are_checked() {
        assert!(Cli::try_parse_from(["curry"]).is_err());
        assert!(Cli::try_parse_from(["curry", "--log-format", "xml", "42"]).is_err());
    }

    #[test]
    fn log_level_defaults() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["curry", "42"])?;
        assert_eq!(cli.log_level, DEFAULT_LOG_LEVEL);
        assert!(!cli.dry_run);
        Ok(())
    }
}
