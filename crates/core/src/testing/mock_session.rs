//! Mock automation session for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::session::{AutomationSession, RawCandidate, RawDetail, SessionError, SessionProfile};

/// Which session capability was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Search,
    FetchDetail,
    Configure,
    SetDeliveryRegion,
}

/// A recorded call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// Query, URL, or region code. Empty for `configure`.
    pub argument: String,
    pub timestamp: Instant,
}

/// Mock implementation of the AutomationSession trait.
///
/// Provides controllable behavior for testing:
/// - Scripted search results per query and details per URL
/// - Per-argument failure counts and a queue of one-shot errors
/// - Recorded calls for assertions
///
/// Unscripted searches return an empty list and unscripted detail fetches
/// fail with `SelectorNotFound`, which is what a captcha page looks like.
///
/// # Example
///
/// ```rust,ignore
/// use shelfscout_core::testing::{fixtures, MockSession};
///
/// let session = MockSession::new();
/// session
///     .set_search_results("Acme", vec![fixtures::candidate("B01", "Acme")])
///     .await;
/// session.fail_times("Acme", 2).await;
///
/// // Third search for "Acme" returns the card.
/// ```
#[derive(Default)]
pub struct MockSession {
    search_results: Arc<RwLock<HashMap<String, Vec<RawCandidate>>>>,
    details: Arc<RwLock<HashMap<String, RawDetail>>>,
    /// Remaining failures per query or URL.
    failures: Arc<RwLock<HashMap<String, u32>>>,
    /// Errors returned by the next calls, whatever their argument.
    queued_errors: Arc<RwLock<VecDeque<SessionError>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    profile: Arc<RwLock<Option<SessionProfile>>>,
    region_fails: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for MockSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSession")
            .field("search_results", &"<results>")
            .field("details", &"<details>")
            .field("calls", &"<calls>")
            .finish()
    }
}

impl MockSession {
    /// Create a mock session with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cards returned when searching for `query`.
    pub async fn set_search_results(&self, query: &str, results: Vec<RawCandidate>) {
        self.search_results
            .write()
            .await
            .insert(query.to_string(), results);
    }

    /// Set the detail returned when fetching `url`.
    pub async fn set_detail(&self, url: &str, detail: RawDetail) {
        self.details.write().await.insert(url.to_string(), detail);
    }

    /// Make the next `count` calls for `argument` (query or URL) time out.
    pub async fn fail_times(&self, argument: &str, count: u32) {
        self.failures
            .write()
            .await
            .insert(argument.to_string(), count);
    }

    /// Queue an error for the next call, regardless of its argument.
    pub async fn push_error(&self, error: SessionError) {
        self.queued_errors.write().await.push_back(error);
    }

    /// Make `set_delivery_region` fail.
    pub async fn fail_delivery_region(&self) {
        *self.region_fails.write().await = true;
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Arguments of recorded calls of one kind, in call order.
    pub async fn calls_of(&self, kind: CallKind) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.argument.clone())
            .collect()
    }

    /// Number of calls made for one argument.
    pub async fn call_count(&self, argument: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.argument == argument)
            .count()
    }

    /// The last profile passed to `configure`.
    pub async fn profile(&self) -> Option<SessionProfile> {
        self.profile.read().await.clone()
    }

    async fn record(&self, kind: CallKind, argument: &str) {
        self.calls.write().await.push(RecordedCall {
            kind,
            argument: argument.to_string(),
            timestamp: Instant::now(),
        });
    }

    /// Take an injected error for this call, if any.
    async fn take_error(&self, argument: &str) -> Option<SessionError> {
        if let Some(err) = self.queued_errors.write().await.pop_front() {
            return Some(err);
        }

        let mut failures = self.failures.write().await;
        match failures.get_mut(argument) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Some(SessionError::NavigationTimeout(argument.to_string()))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl AutomationSession for MockSession {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<Vec<RawCandidate>, SessionError> {
        self.record(CallKind::Search, query).await;

        if let Some(err) = self.take_error(query).await {
            return Err(err);
        }

        Ok(self
            .search_results
            .read()
            .await
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_detail(&self, url: &str) -> Result<RawDetail, SessionError> {
        self.record(CallKind::FetchDetail, url).await;

        if let Some(err) = self.take_error(url).await {
            return Err(err);
        }

        self.details
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| SessionError::SelectorNotFound("#productTitle".to_string()))
    }

    async fn configure(&self, profile: SessionProfile) -> Result<(), SessionError> {
        self.record(CallKind::Configure, "").await;
        *self.profile.write().await = Some(profile);
        Ok(())
    }

    async fn set_delivery_region(&self, code: &str) -> Result<(), SessionError> {
        self.record(CallKind::SetDeliveryRegion, code).await;
        if *self.region_fails.read().await {
            return Err(SessionError::SelectorNotFound(
                "#GLUXZipUpdateInput".to_string(),
            ));
        }
        Ok(())
    }
}
