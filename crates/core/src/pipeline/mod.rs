//! Query-resolution pipelines.
//!
//! Each pipeline reads its query list, resolves every query through a
//! [`QueryJob`] under the retry controller, and persists one batch per query.

mod jobs;
mod runner;
mod types;

pub use jobs::{BrandNameJob, BrandSearchJob, DetailJob, KeywordSearchJob};
pub use runner::PipelineRunner;
pub use types::*;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, PipelineConfig, PipelineKind, SessionConfig};
use crate::input;
use crate::matcher::ResultCap;
use crate::session::{random_user_agent, AutomationSession, SessionError, SessionProfile, Viewport};
use crate::store::IncrementalWriter;

/// Apply the configured profile and, when asked, the delivery region.
///
/// A failed `configure` is fatal. A failed delivery region change is logged
/// and the run carries on.
pub async fn prepare_session(
    session: &dyn AutomationSession,
    config: &SessionConfig,
    set_region: bool,
) -> Result<(), SessionError> {
    let profile = SessionProfile {
        locale: config.locale.clone(),
        viewport: Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
        },
        user_agent: config.user_agent.clone().unwrap_or_else(random_user_agent),
    };
    session.configure(profile).await?;

    if set_region {
        if let Some(code) = config.delivery_region_code() {
            match session.set_delivery_region(code).await {
                Ok(()) => info!("Delivery region set to {}", code),
                Err(e) => warn!("Failed to set delivery region {}: {}", code, e),
            }
        }
    }

    Ok(())
}

/// Run one pipeline end to end: prepare the session, read the input, resolve
/// every query, and write the output configured for that pipeline.
pub async fn run_pipeline(
    kind: PipelineKind,
    config: &Config,
    session: Arc<dyn AutomationSession>,
    cap: ResultCap,
) -> Result<RunSummary, PipelineError> {
    let settings = config.pipeline(kind);
    let column = settings.input_column.as_str();

    // Read the input before touching the session so a bad file fails fast.
    let queries = match kind {
        PipelineKind::Brands => input::brand_queries(&settings.input, column)?,
        PipelineKind::Keywords => input::keyword_queries(&settings.input, column)?,
        PipelineKind::RetryInvalid => input::invalid_brand_queries(&settings.input, column)?,
        PipelineKind::Details => input::detail_queries(&settings.input, column)?,
        PipelineKind::BrandNames => input::brand_name_queries(&settings.input, column)?,
    };

    if queries.is_empty() {
        info!("No queries to process in {}", settings.input.display());
        return Ok(RunSummary::default());
    }

    prepare_session(session.as_ref(), &config.session, kind.uses_delivery_region()).await?;

    match kind {
        PipelineKind::Brands => {
            run_job(BrandSearchJob::new(cap), session, &settings, queries).await
        }
        PipelineKind::RetryInvalid => {
            run_job(BrandSearchJob::retry_invalid(cap), session, &settings, queries).await
        }
        PipelineKind::Keywords => {
            run_job(KeywordSearchJob::new(cap), session, &settings, queries).await
        }
        PipelineKind::Details => run_job(DetailJob::new(), session, &settings, queries).await,
        PipelineKind::BrandNames => {
            let job = BrandNameJob::new(&config.session.base_url);
            run_job(job, session, &settings, queries).await
        }
    }
}

async fn run_job<J: QueryJob>(
    job: J,
    session: Arc<dyn AutomationSession>,
    settings: &PipelineConfig,
    queries: Vec<input::Query>,
) -> Result<RunSummary, PipelineError> {
    let mut writer = IncrementalWriter::new(&settings.output, job.write_mode());
    PipelineRunner::new(job, session, settings)
        .run(queries, &mut writer)
        .await
}
