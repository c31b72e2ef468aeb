//! Spans shared by every stage of a migration run.

use tracing::Span;
use uuid::Uuid;

use crate::init::build_sha;

/// Run-level span plus the identifier stamped on it.
///
/// Futures driven under [`RunContext::span`] inherit `run_id`, both tracker
/// acronyms and the build SHA on every event.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    span: Span,
}

impl RunContext {
    /// Create a `run` span with a fresh run id.
    #[must_use]
    pub fn new(source: &str, target: &str) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "run",
            run_id = %run_id,
            source_tracker = %source,
            target_tracker = %target,
            build_sha = %build_sha()
        );
        Self { run_id, span }
    }

    /// Identifier of this run.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Span to instrument the run with.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }
}

/// Span wrapping one task of a batch.
#[must_use]
pub fn task_span(index: usize, label: &str) -> Span {
    tracing::info_span!(
        "migrate",
        task = index,
        input = %label,
        torrent_id = tracing::field::Empty,
        path = tracing::field::Empty
    )
}

/// Record the resolved release on the current task span.
pub fn record_release(torrent_id: u64, path: &str) {
    let span = Span::current();
    span.record("torrent_id", torrent_id);
    span.record("path", tracing::field::display(path));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_run_gets_its_own_id() {
        let first = RunContext::new("OPS", "RED");
        let second = RunContext::new("OPS", "RED");
        assert_ne!(first.run_id(), second.run_id());
        assert_eq!(first.clone().run_id(), first.run_id());
    }

    #[test]
    fn task_span_records_release_fields() {
        let span = task_span(0, "/tmp/a.torrent");
        let _entered = span.enter();
        record_release(42, "Artist - Album");
    }
}
