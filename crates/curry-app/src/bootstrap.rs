use std::path::PathBuf;
use std::sync::Arc;

use curry_config::CurryConfig;
use curry_core::{MetadataMapper, TorrentDownloader, TrackerEndpoint};
use curry_telemetry::RunContext;
use curry_torrent::{
    ContentHasher, Mktorrent, ResolverContext, ResolverSettings, TorrentFileResolver,
};
use curry_tracker::TrackerClient;
use tracing::{Instrument, info};

use crate::error::{AppError, AppResult};
use crate::input::{InputRef, parse_input};
use crate::orchestrator::{BatchReport, MigrationOrchestrator, OrchestratorParts};

/// What the binary was asked to do.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Explicit configuration file, if any.
    pub config_path: Option<PathBuf>,
    /// Torrent id, source URL or batch folder.
    pub input: String,
    /// Skip hashing local content; every release is patched.
    pub no_hasher: bool,
    /// Stop before uploading.
    pub dry_run: bool,
}

/// Load configuration, locate the hasher and migrate `options.input`.
///
/// # Errors
///
/// Configuration, input, hasher, credential and index failures end the run
/// before any task starts. See [`run_with`].
pub async fn run(options: RunOptions) -> AppResult<BatchReport> {
    let path = curry_config::resolve_path(options.config_path.as_deref());
    let config = curry_config::load(&path).map_err(|err| AppError::config("config.load", err))?;
    let input = parse_input(&options.input)?;

    let hasher: Option<Arc<dyn ContentHasher>> = if options.no_hasher {
        info!("content hasher disabled; patching source torrents");
        None
    } else {
        let mktorrent = Mktorrent::locate()
            .await
            .map_err(|source| AppError::Hasher { source })?;
        Some(Arc::new(mktorrent))
    };

    run_with(&config, &input, hasher, options.dry_run).await
}

/// Wire the pipeline from an already-loaded configuration and run it.
///
/// # Errors
///
/// `Config` for missing credentials, `Migration` when a tracker index cannot
/// be fetched or a task fails authentication, and the input errors of
/// [`MigrationOrchestrator::run`].
pub async fn run_with(
    config: &CurryConfig,
    input: &InputRef,
    hasher: Option<Arc<dyn ContentHasher>>,
    dry_run: bool,
) -> AppResult<BatchReport> {
    let source_endpoint = config
        .source_endpoint()
        .map_err(|err| AppError::config("config.source", err))?;
    let target_endpoint = config
        .target_endpoint()
        .map_err(|err| AppError::config("config.target", err))?;

    let run = RunContext::new(&source_endpoint.acronym, &target_endpoint.acronym);
    info!(parent: run.span(), run_id = %run.run_id(), "run context established");
    migrate(config, input, hasher, dry_run, source_endpoint, target_endpoint)
        .instrument(run.span().clone())
        .await
}

async fn migrate(
    config: &CurryConfig,
    input: &InputRef,
    hasher: Option<Arc<dyn ContentHasher>>,
    dry_run: bool,
    source_endpoint: TrackerEndpoint,
    target_endpoint: TrackerEndpoint,
) -> AppResult<BatchReport> {
    let source = Arc::new(
        TrackerClient::new(source_endpoint.clone(), config.http_timeout())
            .map_err(|err| AppError::migration("client.source", err))?,
    );
    let destination = Arc::new(
        TrackerClient::new(target_endpoint.clone(), config.http_timeout())
            .map_err(|err| AppError::migration("client.target", err))?,
    );

    let destination_keys = destination
        .fetch_index()
        .await
        .map_err(|err| AppError::migration("index.target", err))?;
    let source_keys = source
        .fetch_index()
        .await
        .map_err(|err| AppError::migration("index.source", err))?;
    info!(user_id = source_keys.id, "fetched tracker keys");

    let downloader: Arc<dyn TorrentDownloader> = source.clone();
    let resolver = TorrentFileResolver::new(
        ResolverSettings {
            seeding_folder: config.seeding_folder.clone(),
            work_dir: config.work_dir.clone(),
            rewrite_source_tag: config.rewrite_source_tag,
        },
        ResolverContext {
            source: source_endpoint.clone(),
            source_keys: source_keys.clone(),
            destination: target_endpoint.clone(),
            destination_keys: destination_keys.clone(),
        },
        hasher,
        downloader,
    );
    let mapper = MetadataMapper::new(source_endpoint, target_endpoint, source_keys.id);

    let orchestrator = MigrationOrchestrator::new(OrchestratorParts {
        source,
        destination,
        resolver,
        mapper,
        destination_keys,
        torrent_folder: config.torrent_folder.clone(),
        dry_run,
    });
    orchestrator.run(input).await
}
