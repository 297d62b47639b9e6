//! Query types read from input files.

use serde::{Deserialize, Serialize};

use crate::sanitizer::sanitize;
use crate::store::NO_VALID_PRODUCT;

/// What a query's text identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Brand,
    Keyword,
    AsinLookup,
}

/// One unit of work for a pipeline. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Brand name, keyword, or ASIN exactly as read (trimmed).
    pub raw_text: String,
    pub kind: QueryKind,
    /// Product link, for ASIN lookups that carry one.
    pub link: Option<String>,
    /// The brand or keyword an ASIN was found under.
    pub origin: Option<String>,
}

impl Query {
    pub fn brand(raw: impl Into<String>) -> Self {
        Self {
            raw_text: raw.into(),
            kind: QueryKind::Brand,
            link: None,
            origin: None,
        }
    }

    pub fn keyword(raw: impl Into<String>) -> Self {
        Self {
            raw_text: raw.into(),
            kind: QueryKind::Keyword,
            link: None,
            origin: None,
        }
    }

    pub fn asin_lookup(asin: impl Into<String>, link: Option<String>, origin: Option<String>) -> Self {
        Self {
            raw_text: asin.into(),
            kind: QueryKind::AsinLookup,
            link,
            origin,
        }
    }

    /// Rows carrying the "no valid product" marker are skipped, never searched.
    pub fn is_sentinel(&self) -> bool {
        self.raw_text.trim().eq_ignore_ascii_case(NO_VALID_PRODUCT)
    }

    /// Compute the text sent to the session.
    pub fn sanitized(&self) -> SanitizedQuery {
        let cleaned_text = match self.kind {
            QueryKind::Brand => sanitize(&self.raw_text),
            QueryKind::Keyword | QueryKind::AsinLookup => self.raw_text.trim().to_string(),
        };
        SanitizedQuery { cleaned_text }
    }
}

/// Search-safe form of a query. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedQuery {
    pub cleaned_text: String,
}

impl SanitizedQuery {
    pub fn as_str(&self) -> &str {
        &self.cleaned_text
    }

    pub fn is_empty(&self) -> bool {
        self.cleaned_text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_query_is_sanitized() {
        let query = Query::brand("Nike Inc.");
        assert_eq!(query.sanitized().as_str(), "Nike");
        assert_eq!(query.raw_text, "Nike Inc.");
    }

    #[test]
    fn test_keyword_query_is_only_trimmed() {
        let query = Query::keyword("  running shoes, men's ");
        assert_eq!(query.sanitized().as_str(), "running shoes, men's");
    }

    #[test]
    fn test_sentinel_detection_ignores_case() {
        assert!(Query::brand("No Valid Product").is_sentinel());
        assert!(Query::asin_lookup("no valid product", None, None).is_sentinel());
        assert!(!Query::brand("Valid Product Co").is_sentinel());
    }

    #[test]
    fn test_asin_lookup_carries_link_and_origin() {
        let query = Query::asin_lookup(
            "B0TEST0001",
            Some("https://shop.example/dp/B0TEST0001".into()),
            Some("Acme".into()),
        );
        assert_eq!(query.kind, QueryKind::AsinLookup);
        assert_eq!(query.sanitized().as_str(), "B0TEST0001");
        assert_eq!(query.origin.as_deref(), Some("Acme"));
    }
}
