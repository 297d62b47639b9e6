//! Types for the automation session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A product card extracted from one search results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCandidate {
    /// Amazon Standard Identification Number of the product.
    pub asin: String,
    /// Product title as displayed on the card.
    pub title: String,
    /// Brand line shown on the card (may be empty when the card has none).
    pub brand_text: String,
    /// Absolute link to the product page.
    pub link: String,
}

/// Data extracted from one product detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDetail {
    /// Product title.
    pub title: String,
    /// Category breadcrumbs, outermost first.
    pub breadcrumbs: Vec<String>,
    /// The "Visit the X Store" / "Brand: X" byline, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    /// Brand from the product overview table, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

/// Browser-like presentation settings applied to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Value sent as `Accept-Language`.
    pub locale: String,
    /// Viewport size advertised to the site.
    pub viewport: Viewport,
    /// User agent string.
    pub user_agent: String,
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Errors raised by a session call.
///
/// Every variant is transient from the pipeline's point of view: the retry
/// controller absorbs them.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("navigation timed out: {0}")]
    NavigationTimeout(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("session setup failed: {0}")]
    Setup(String),
}

impl SessionError {
    /// Timeouts and missing selectors are the two failures a page load is
    /// expected to produce under normal operation.
    pub fn is_page_failure(&self) -> bool {
        matches!(
            self,
            SessionError::NavigationTimeout(_) | SessionError::SelectorNotFound(_)
        )
    }
}

/// Capability the pipeline needs from a browser-like session.
///
/// A single session is shared across a whole run and is not safe for
/// concurrent navigation; callers issue one call at a time.
#[async_trait]
pub trait AutomationSession: Send + Sync {
    /// Session backend name for logging.
    fn name(&self) -> &str;

    /// Run a site search and return every product card on the first page.
    async fn search(&self, query: &str) -> Result<Vec<RawCandidate>, SessionError>;

    /// Load a product page and extract its details.
    async fn fetch_detail(&self, url: &str) -> Result<RawDetail, SessionError>;

    /// Apply locale, viewport and user agent to subsequent calls.
    async fn configure(&self, profile: SessionProfile) -> Result<(), SessionError>;

    /// Set the delivery region (zip/pin code) used for search results.
    ///
    /// Best effort: callers log failures and carry on.
    async fn set_delivery_region(&self, code: &str) -> Result<(), SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::SelectorNotFound("#productTitle".to_string());
        assert_eq!(err.to_string(), "selector not found: #productTitle");

        let err = SessionError::HttpStatus {
            status: 503,
            url: "https://example.com/s?k=x".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503 for https://example.com/s?k=x");
    }

    #[test]
    fn test_page_failure_classification() {
        assert!(SessionError::NavigationTimeout("x".into()).is_page_failure());
        assert!(SessionError::SelectorNotFound("x".into()).is_page_failure());
        assert!(!SessionError::ConnectionFailed("x".into()).is_page_failure());
    }

    #[test]
    fn test_raw_detail_serialization_skips_missing_optionals() {
        let detail = RawDetail {
            title: "Shoe".to_string(),
            breadcrumbs: vec!["Clothing".to_string(), "Shoes".to_string()],
            byline: None,
            brand: None,
        };
        let json = serde_json::to_string(&detail).unwrap();
        assert!(!json.contains("byline"));
        assert!(!json.contains("brand"));

        let parsed: RawDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, detail);
    }
}
