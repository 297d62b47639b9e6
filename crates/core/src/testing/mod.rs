//! Testing utilities and a mock session for end-to-end tests.
//!
//! `MockSession` stands in for the retail site, so pipelines can be driven
//! without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use shelfscout_core::testing::{fixtures, MockSession};
//!
//! let session = MockSession::new();
//!
//! // Configure mock responses
//! session.set_search_results("Acme", vec![fixtures::candidate("B01", "Acme")]).await;
//! session.fail_times("Acme", 1).await;
//!
//! // Hand it to a pipeline as Arc<dyn AutomationSession>...
//! ```

mod mock_session;

pub use mock_session::{CallKind, MockSession, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::session::{RawCandidate, RawDetail};

    /// Create a search result card with reasonable defaults.
    pub fn candidate(asin: &str, brand: &str) -> RawCandidate {
        RawCandidate {
            asin: asin.to_string(),
            title: format!("{} Product {}", brand, asin),
            brand_text: brand.to_string(),
            link: product_link(asin),
        }
    }

    /// Product link in the form the mock expects for detail fetches.
    pub fn product_link(asin: &str) -> String {
        format!("https://shop.example/dp/{}", asin)
    }

    /// Create a product detail page.
    pub fn detail(title: &str, breadcrumbs: &[&str], brand: Option<&str>) -> RawDetail {
        RawDetail {
            title: title.to_string(),
            breadcrumbs: breadcrumbs.iter().map(|b| b.to_string()).collect(),
            byline: brand.map(|b| format!("Brand: {}", b)),
            brand: brand.map(str::to_string),
        }
    }
}
