//! One job per pipeline.

use async_trait::async_trait;

use crate::config::PipelineKind;
use crate::input::{Query, QueryKind, SanitizedQuery};
use crate::matcher::{match_candidates, MatchSummary, ResultCap};
use crate::retry::{RetryController, RetryOutcome};
use crate::session::{AutomationSession, RawDetail, SessionError};
use crate::store::{BrandNameRecord, DetailRecord, ResultRecord, WriteMode};

use super::types::{JobOutput, QueryJob};

/// Search for a brand and keep the cards whose brand line matches it.
///
/// Shared by the `brands` and `retry-invalid` pipelines.
#[derive(Debug, Clone, Copy)]
pub struct BrandSearchJob {
    kind: PipelineKind,
    cap: ResultCap,
}

impl BrandSearchJob {
    pub fn new(cap: ResultCap) -> Self {
        Self {
            kind: PipelineKind::Brands,
            cap,
        }
    }

    /// Same job, reported as the `retry-invalid` pipeline.
    pub fn retry_invalid(cap: ResultCap) -> Self {
        Self {
            kind: PipelineKind::RetryInvalid,
            cap,
        }
    }
}

#[async_trait]
impl QueryJob for BrandSearchJob {
    type Record = ResultRecord;

    fn kind(&self) -> PipelineKind {
        self.kind
    }

    async fn resolve(
        &self,
        session: &dyn AutomationSession,
        retry: &RetryController,
        query: &Query,
        sanitized: &SanitizedQuery,
    ) -> JobOutput<ResultRecord> {
        let brand = sanitized.as_str();

        // The cap is applied once a page is accepted, so it never turns a
        // matching page into a retry.
        let outcome = retry
            .resolve_with(
                brand,
                move || async move {
                    let cards = session.search(brand).await?;
                    Ok::<_, SessionError>(match_candidates(brand, cards, ResultCap::All))
                },
                |summary: &MatchSummary| !summary.is_empty(),
            )
            .await;

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                let mut accepted = value.accepted;
                self.cap.apply(&mut accepted);
                if accepted.is_empty() {
                    return JobOutput::failed(self.failure(query), attempts);
                }
                let records = accepted
                    .into_iter()
                    .map(|m| ResultRecord::matched(brand, m))
                    .collect();
                JobOutput::resolved(records, attempts)
            }
            RetryOutcome::Exhausted { attempts, .. } => {
                JobOutput::failed(self.failure(query), attempts)
            }
        }
    }

    fn failure(&self, query: &Query) -> Vec<ResultRecord> {
        vec![ResultRecord::sentinel(QueryKind::Brand, &query.raw_text)]
    }

    fn unsearchable(&self, query: &Query) -> Vec<ResultRecord> {
        vec![ResultRecord::unsearchable(QueryKind::Brand, &query.raw_text)]
    }
}

/// Search for a keyword and keep the returned product links.
#[derive(Debug, Clone, Copy)]
pub struct KeywordSearchJob {
    cap: ResultCap,
}

impl KeywordSearchJob {
    pub fn new(cap: ResultCap) -> Self {
        Self { cap }
    }
}

#[async_trait]
impl QueryJob for KeywordSearchJob {
    type Record = ResultRecord;

    fn kind(&self) -> PipelineKind {
        PipelineKind::Keywords
    }

    async fn resolve(
        &self,
        session: &dyn AutomationSession,
        retry: &RetryController,
        query: &Query,
        sanitized: &SanitizedQuery,
    ) -> JobOutput<ResultRecord> {
        let keyword = sanitized.as_str();
        let outcome = retry
            .resolve_non_empty(keyword, move || session.search(keyword))
            .await;

        match outcome {
            RetryOutcome::Succeeded { mut value, attempts } => {
                self.cap.apply(&mut value);
                if value.is_empty() {
                    return JobOutput::failed(self.failure(query), attempts);
                }
                let records = value
                    .into_iter()
                    .map(|card| ResultRecord::for_keyword(keyword, card))
                    .collect();
                JobOutput::resolved(records, attempts)
            }
            RetryOutcome::Exhausted { attempts, .. } => {
                JobOutput::failed(self.failure(query), attempts)
            }
        }
    }

    fn failure(&self, query: &Query) -> Vec<ResultRecord> {
        vec![ResultRecord::sentinel(QueryKind::Keyword, &query.raw_text)]
    }

    fn unsearchable(&self, query: &Query) -> Vec<ResultRecord> {
        vec![ResultRecord::unsearchable(QueryKind::Keyword, &query.raw_text)]
    }
}

/// Load a product page and record its breadcrumbs and brand byline.
///
/// A page without breadcrumbs counts as a failed load.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailJob;

impl DetailJob {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QueryJob for DetailJob {
    type Record = DetailRecord;

    fn kind(&self) -> PipelineKind {
        PipelineKind::Details
    }

    async fn resolve(
        &self,
        session: &dyn AutomationSession,
        retry: &RetryController,
        query: &Query,
        sanitized: &SanitizedQuery,
    ) -> JobOutput<DetailRecord> {
        let Some(link) = query.link.as_deref() else {
            return JobOutput::failed(self.failure(query), 0);
        };

        let outcome = retry
            .resolve_completed(sanitized.as_str(), move || async move {
                let detail = session.fetch_detail(link).await?;
                if detail.breadcrumbs.is_empty() {
                    return Err(SessionError::SelectorNotFound("breadcrumbs".to_string()));
                }
                Ok::<RawDetail, SessionError>(detail)
            })
            .await;

        let searched_brand = query.origin.as_deref().unwrap_or_default();
        match outcome {
            RetryOutcome::Succeeded { value, attempts } => JobOutput::resolved(
                vec![DetailRecord::success(
                    &query.raw_text,
                    searched_brand,
                    link,
                    value,
                )],
                attempts,
            ),
            RetryOutcome::Exhausted { attempts, .. } => {
                JobOutput::failed(self.failure(query), attempts)
            }
        }
    }

    fn failure(&self, query: &Query) -> Vec<DetailRecord> {
        vec![DetailRecord::failed(
            &query.raw_text,
            query.origin.as_deref().unwrap_or_default(),
            query.link.as_deref().unwrap_or_default(),
        )]
    }
}

/// Look up the brand name of an ASIN on its product page.
///
/// Results are kept as a full snapshot, rewritten after every ASIN.
#[derive(Debug, Clone)]
pub struct BrandNameJob {
    origin: String,
}

impl BrandNameJob {
    /// `base_url` is the site origin product pages live under.
    pub fn new(base_url: &str) -> Self {
        Self {
            origin: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Product page URL for an ASIN, percent-encoded.
    pub fn product_url(&self, asin: &str) -> String {
        format!("{}/dp/{}", self.origin, urlencoding::encode(asin))
    }
}

#[async_trait]
impl QueryJob for BrandNameJob {
    type Record = BrandNameRecord;

    fn kind(&self) -> PipelineKind {
        PipelineKind::BrandNames
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Snapshot
    }

    async fn resolve(
        &self,
        session: &dyn AutomationSession,
        retry: &RetryController,
        query: &Query,
        sanitized: &SanitizedQuery,
    ) -> JobOutput<BrandNameRecord> {
        let url = self.product_url(sanitized.as_str());
        let page = url.as_str();

        let outcome = retry
            .resolve_with(
                sanitized.as_str(),
                move || async move {
                    let detail = session.fetch_detail(page).await?;
                    Ok::<_, SessionError>(detail.brand)
                },
                |brand: &Option<String>| brand.as_deref().is_some_and(|b| !b.trim().is_empty()),
            )
            .await;

        let keyword = query.origin.as_deref().unwrap_or_default();
        match outcome {
            RetryOutcome::Succeeded { value, attempts } => JobOutput::resolved(
                vec![BrandNameRecord::new(
                    &query.raw_text,
                    keyword,
                    &url,
                    value.map(|b| b.trim().to_string()),
                )],
                attempts,
            ),
            RetryOutcome::Exhausted { attempts, .. } => {
                JobOutput::failed(self.failure(query), attempts)
            }
        }
    }

    fn failure(&self, query: &Query) -> Vec<BrandNameRecord> {
        vec![BrandNameRecord::new(
            &query.raw_text,
            query.origin.as_deref().unwrap_or_default(),
            &self.product_url(query.raw_text.trim()),
            None,
        )]
    }
}
