//! Drives every task of a run through fetch, generate, map, upload and
//! cleanup, one at a time.

use std::path::PathBuf;
use std::sync::Arc;

use curry_core::{
    ErrorKind, GeneratedTorrentFile, IndexInfo, MetadataMapper, MigrationError, MigrationResult,
    MigrationTask, SourceReleaseRecord, TaskState,
};
use curry_telemetry::{record_release, task_span};
use curry_torrent::{ResolvedTorrent, TorrentFileResolver};
use curry_tracker::TrackerClient;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::input::{self, InputRef, Lookup, TaskInput};

/// Result of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The destination accepted the upload.
    Uploaded {
        /// Destination page of the new torrent.
        location: String,
    },
    /// The task stopped on purpose (dry run, already migrated).
    Skipped {
        /// Why nothing was uploaded.
        reason: String,
    },
    /// The task failed; the batch went on.
    Failed {
        /// Error kind.
        kind: ErrorKind,
        /// Human-readable message.
        message: String,
    },
}

/// Outcome of one task, labelled with its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    /// Torrent id or local file the task came from.
    pub label: String,
    /// What happened.
    pub outcome: Outcome,
}

/// Per-task outcomes of a run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per task.
    pub tasks: Vec<TaskReport>,
}

impl BatchReport {
    /// Number of accepted uploads.
    #[must_use]
    pub fn uploaded(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Uploaded { .. }))
    }

    /// Number of tasks skipped on purpose.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Skipped { .. }))
    }

    /// Number of failed tasks.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.tasks
            .iter()
            .filter(|task| predicate(&task.outcome))
            .count()
    }

    fn log_summary(&self) {
        info!(
            total = self.tasks.len(),
            uploaded = self.uploaded(),
            skipped = self.skipped(),
            failed = self.failed(),
            "migration run finished"
        );
    }
}

/// Collaborators of the orchestrator, built once per run.
pub struct OrchestratorParts {
    /// Client for the tracker releases come from.
    pub source: Arc<TrackerClient>,
    /// Client for the tracker releases go to.
    pub destination: Arc<TrackerClient>,
    /// Produces destination torrents.
    pub resolver: TorrentFileResolver,
    /// Builds upload payloads.
    pub mapper: MetadataMapper,
    /// Keys of the running user on the destination.
    pub destination_keys: IndexInfo,
    /// Where single-item runs put accepted torrents.
    pub torrent_folder: Option<PathBuf>,
    /// Stop before uploading.
    pub dry_run: bool,
}

/// Sequential migration pipeline.
pub struct MigrationOrchestrator {
    source: Arc<TrackerClient>,
    destination: Arc<TrackerClient>,
    resolver: TorrentFileResolver,
    mapper: MetadataMapper,
    destination_keys: IndexInfo,
    torrent_folder: Option<PathBuf>,
    dry_run: bool,
}

impl MigrationOrchestrator {
    /// Assemble the orchestrator.
    #[must_use]
    pub fn new(parts: OrchestratorParts) -> Self {
        let OrchestratorParts {
            source,
            destination,
            resolver,
            mapper,
            destination_keys,
            torrent_folder,
            dry_run,
        } = parts;
        Self {
            source,
            destination,
            resolver,
            mapper,
            destination_keys,
            torrent_folder,
            dry_run,
        }
    }

    /// Turn `input` into tasks and run each of them in order.
    ///
    /// Task failures are recorded in the report and the run continues.
    ///
    /// # Errors
    ///
    /// `InvalidInput`/`EmptyBatch` when the input yields no tasks, and
    /// `Migration` when a task fails with an authentication error, which ends
    /// the run.
    pub async fn run(&self, input: &InputRef) -> AppResult<BatchReport> {
        let tasks = self.tasks_for(input)?;
        info!(tasks = tasks.len(), dry_run = self.dry_run, "starting migration");

        let mut report = BatchReport::default();
        for (index, task) in tasks.iter().enumerate() {
            let result = self
                .migrate(task)
                .instrument(task_span(index, &task.label))
                .await;
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) if err.is_fatal() => {
                    error!(input = %task.label, error = %err, "authentication failed; aborting run");
                    report.log_summary();
                    return Err(AppError::migration("task", err));
                }
                Err(err) if err.kind() == ErrorKind::AlreadyMigrated => {
                    warn!(input = %task.label, reason = %err.message(), "skipping release");
                    Outcome::Skipped {
                        reason: err.message().to_string(),
                    }
                }
                Err(err) => {
                    error!(
                        input = %task.label,
                        state = TaskState::Failed.as_str(),
                        kind = %err.kind(),
                        tracker = err.tracker().unwrap_or_default(),
                        error = %err.message(),
                        "task failed"
                    );
                    Outcome::Failed {
                        kind: err.kind(),
                        message: err.message().to_string(),
                    }
                }
            };
            report.tasks.push(TaskReport {
                label: task.label.clone(),
                outcome,
            });
        }
        report.log_summary();
        Ok(report)
    }

    fn tasks_for(&self, input: &InputRef) -> AppResult<Vec<TaskInput>> {
        match input {
            InputRef::TorrentId(torrent_id) => Ok(vec![input::single_task(
                *torrent_id,
                self.torrent_folder.as_deref(),
            )]),
            InputRef::Directory(folder) => {
                input::scan_directory(folder, &self.source.endpoint().announce_host)
            }
        }
    }

    async fn migrate(&self, input: &TaskInput) -> MigrationResult<Outcome> {
        debug!(state = TaskState::Resolved.as_str(), "task resolved");
        let record = self.fetch(&input.lookup).await?;
        record_release(record.torrent_id, &record.file_path);
        let task = MigrationTask {
            record,
            destination_folder: input.destination_folder.clone(),
        };
        debug!(state = TaskState::Fetched.as_str(), "release fetched");

        self.mapper.guard_self_repost(&task.record)?;

        let ResolvedTorrent {
            file,
            logs,
            strategy,
        } = self.resolver.resolve(&task.record).await?;
        info!(
            state = TaskState::Generated.as_str(),
            strategy = strategy.as_str(),
            path = %file.path().display(),
            "destination torrent ready"
        );

        let payload = match self.mapper.map(
            &task.record,
            &file,
            logs,
            &self.destination_keys.authkey,
        ) {
            Ok(payload) => payload,
            Err(err) => return Err(discard_after(file, err)),
        };
        debug!(
            state = TaskState::Mapped.as_str(),
            title = %payload.title,
            release_type = payload.release_type,
            artists = payload.artists.len(),
            logs = payload.logs.len(),
            "upload payload built"
        );

        if self.dry_run {
            info!(
                title = %payload.title,
                year = payload.year,
                format = %payload.format,
                encoding = %payload.bitrate,
                "dry run; not uploading"
            );
            file.discard()?;
            return Ok(Outcome::Skipped {
                reason: "dry run".to_string(),
            });
        }

        let location = match self.destination.upload(payload).await {
            Ok(location) => location,
            Err(err) => return Err(discard_after(file, err)),
        };
        info!(state = TaskState::Uploaded.as_str(), %location, "release migrated");
        place(file, &task);
        Ok(Outcome::Uploaded { location })
    }

    async fn fetch(&self, lookup: &Lookup) -> MigrationResult<SourceReleaseRecord> {
        match lookup {
            Lookup::Id(torrent_id) => self.source.fetch_torrent_by_id(*torrent_id).await,
            Lookup::Hash(info_hash) => self.source.fetch_torrent_by_hash(info_hash).await,
        }
    }
}

fn discard_after(file: GeneratedTorrentFile, err: MigrationError) -> MigrationError {
    let path = file.path().display().to_string();
    if let Err(cleanup) = file.discard() {
        warn!(%path, error = %cleanup, "could not delete generated torrent");
    } else {
        debug!(%path, "deleted generated torrent");
    }
    err
}

fn place(file: GeneratedTorrentFile, task: &MigrationTask) {
    let Some(folder) = task
        .destination_folder
        .as_deref()
        .filter(|folder| folder.is_dir())
    else {
        info!(path = %file.path().display(), "torrent left in work dir");
        return;
    };
    match file.relocate(folder) {
        Ok(path) => info!(path = %path.display(), "torrent moved to destination folder"),
        Err(err) => warn!(error = %err, "upload succeeded but the torrent could not be moved"),
    }
}
