//! Pipeline types.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::PipelineKind;
use crate::input::{InputError, Query, SanitizedQuery};
use crate::retry::RetryController;
use crate::session::{AutomationSession, SessionError};
use crate::store::{Record, WriteMode, WriterError};

/// Errors that abort a run. Per-query session failures never end up here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("Session setup failed: {0}")]
    Session(#[from] SessionError),
}

/// Records produced for one query, plus how it was resolved.
#[derive(Debug)]
pub struct JobOutput<R> {
    /// The batch to persist: one row per accepted result, or one failure row.
    pub records: Vec<R>,
    /// Whether the success condition was met.
    pub resolved: bool,
    /// Session calls made for this query.
    pub attempts: u32,
}

impl<R> JobOutput<R> {
    pub fn resolved(records: Vec<R>, attempts: u32) -> Self {
        Self {
            records,
            resolved: true,
            attempts,
        }
    }

    pub fn failed(records: Vec<R>, attempts: u32) -> Self {
        Self {
            records,
            resolved: false,
            attempts,
        }
    }
}

/// What a pipeline does with one query.
///
/// A job runs its session call under the retry controller and turns the
/// terminal outcome into records. It never writes output itself.
#[async_trait]
pub trait QueryJob: Send + Sync {
    type Record: Record + Send;

    fn kind(&self) -> PipelineKind;

    fn write_mode(&self) -> WriteMode {
        WriteMode::Append
    }

    /// Resolve one query against the session.
    async fn resolve(
        &self,
        session: &dyn AutomationSession,
        retry: &RetryController,
        query: &Query,
        sanitized: &SanitizedQuery,
    ) -> JobOutput<Self::Record>;

    /// The failure batch for a query that could not be resolved.
    fn failure(&self, query: &Query) -> Vec<Self::Record>;

    /// The failure batch for a query left empty by cleaning, which is never
    /// sent to the session.
    fn unsearchable(&self, query: &Query) -> Vec<Self::Record> {
        self.failure(query)
    }
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Queries handed to the job (sentinels excluded).
    pub processed: usize,
    /// Queries that met their success condition.
    pub succeeded: usize,
    /// Queries that produced a failure row.
    pub failed: usize,
    /// Sentinel queries skipped without touching the session.
    pub skipped: usize,
    /// Rows persisted.
    pub rows_written: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed ({} succeeded, {} failed), {} skipped, {} row(s) written",
            self.processed, self.succeeded, self.failed, self.skipped, self.rows_written
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            processed: 3,
            succeeded: 2,
            failed: 1,
            skipped: 1,
            rows_written: 5,
        };
        assert_eq!(
            summary.to_string(),
            "3 processed (2 succeeded, 1 failed), 1 skipped, 5 row(s) written"
        );
    }

    #[test]
    fn test_error_from_writer() {
        let err: PipelineError = WriterError::Io {
            path: "out.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(err.to_string().starts_with("Writer error: I/O error on out.csv"));
    }
}
