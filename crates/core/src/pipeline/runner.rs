//! Pipeline run loop.
//!
//! Walks the query list strictly in order with one session call in flight:
//! - Sentinel queries are skipped without touching the session
//! - Every other query yields exactly one batch, written before the next
//!   query starts
//! - A fixed cooldown follows every processed query, whatever its outcome

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::input::{Query, QueryKind};
use crate::retry::{RetryController, RetryPolicy};
use crate::session::AutomationSession;
use crate::store::IncrementalWriter;

use super::types::{JobOutput, PipelineError, QueryJob, RunSummary};

/// Drives one job over a list of queries.
pub struct PipelineRunner<J: QueryJob> {
    job: J,
    session: Arc<dyn AutomationSession>,
    retry: RetryController,
    cooldown: Duration,
}

impl<J: QueryJob> PipelineRunner<J> {
    /// Create a runner using the pipeline's attempt budget, backoff and cooldown.
    pub fn new(job: J, session: Arc<dyn AutomationSession>, config: &PipelineConfig) -> Self {
        Self {
            job,
            session,
            retry: RetryController::new(RetryPolicy::from(config)),
            cooldown: config.cooldown(),
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryController::new(policy);
        self
    }

    /// Override the pause between queries.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Process every query and persist its batch through `writer`.
    ///
    /// Only writer failures abort the run; session failures become failure
    /// rows.
    pub async fn run(
        &self,
        queries: Vec<Query>,
        writer: &mut IncrementalWriter<J::Record>,
    ) -> Result<RunSummary, PipelineError> {
        let kind = self.job.kind();
        let total = queries.len();
        let mut summary = RunSummary::default();

        info!(
            "Starting {} pipeline: {} quer{} via {} session, writing to {}",
            kind,
            total,
            if total == 1 { "y" } else { "ies" },
            self.session.name(),
            writer.path().display()
        );

        for (index, query) in queries.iter().enumerate() {
            if query.is_sentinel() {
                debug!("Skipping {} (marked as no valid product)", query.raw_text);
                summary.skipped += 1;
                continue;
            }

            let sanitized = query.sanitized();
            if query.kind == QueryKind::Brand {
                info!("Original: \"{}\" -> Cleaned: \"{}\"", query.raw_text, sanitized.as_str());
            }

            let output = if sanitized.is_empty() {
                warn!("Query \"{}\" is empty after cleaning, recording a failure", query.raw_text);
                JobOutput::failed(self.job.unsearchable(query), 0)
            } else {
                self.job
                    .resolve(self.session.as_ref(), &self.retry, query, &sanitized)
                    .await
            };

            let rows = output.records.len();
            writer.commit(output.records)?;

            summary.processed += 1;
            summary.rows_written += rows;
            if output.resolved {
                summary.succeeded += 1;
                info!(
                    "[{}/{}] {}: {} row(s) after {} attempt(s)",
                    index + 1,
                    total,
                    sanitized.as_str(),
                    rows,
                    output.attempts
                );
            } else {
                summary.failed += 1;
                info!(
                    "[{}/{}] {}: no valid result after {} attempt(s)",
                    index + 1,
                    total,
                    sanitized.as_str(),
                    output.attempts
                );
            }

            if !self.cooldown.is_zero() {
                tokio::time::sleep(self.cooldown).await;
            }
        }

        info!("{} pipeline finished: {}", kind, summary);
        Ok(summary)
    }
}
