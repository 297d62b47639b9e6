//! Output record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::input::QueryKind;
use crate::matcher::{MatchedCandidate, NO_MATCH_LABEL};
use crate::session::RawCandidate;

/// Marker written in place of an ASIN/title/link when nothing was found.
pub const NO_VALID_PRODUCT: &str = "no valid product";

/// Marker written in every detail field when a product page never loaded.
pub const FAILED_TO_SCRAPE: &str = "failed to scrape";

/// A row type the incremental writer can persist.
pub trait Record: Serialize {
    /// Column names, in serialization order.
    fn headers(&self) -> &'static [&'static str];
}

/// Outcome of a search-driven query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    Failed,
    NoValidProduct,
}

/// One row of the brand map or keyword map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub asin: String,
    /// The brand (cleaned on success, raw on sentinel rows) or keyword.
    pub brand_name_or_keyword: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub matched_word: Option<String>,
    pub status: RecordStatus,
    pub scraped_at: DateTime<Utc>,
    #[serde(skip)]
    pub kind: QueryKind,
}

const BRAND_HEADERS: &[&str] = &[
    "asin",
    "brandName",
    "title",
    "link",
    "matchedWord",
    "status",
    "scrapedAt",
];

const KEYWORD_HEADERS: &[&str] = &[
    "asin",
    "keywordName",
    "title",
    "link",
    "matchedWord",
    "status",
    "scrapedAt",
];

impl ResultRecord {
    /// A matched product for a brand query.
    pub fn matched(brand: &str, matched: MatchedCandidate) -> Self {
        let MatchedCandidate { candidate, result } = matched;
        Self {
            asin: candidate.asin,
            brand_name_or_keyword: brand.to_string(),
            title: Some(candidate.title),
            link: Some(candidate.link),
            matched_word: Some(result.label()),
            status: RecordStatus::Success,
            scraped_at: Utc::now(),
            kind: QueryKind::Brand,
        }
    }

    /// A product returned for a keyword query.
    pub fn for_keyword(keyword: &str, candidate: RawCandidate) -> Self {
        Self {
            asin: candidate.asin,
            brand_name_or_keyword: keyword.to_string(),
            title: Some(candidate.title),
            link: Some(candidate.link),
            matched_word: None,
            status: RecordStatus::Success,
            scraped_at: Utc::now(),
            kind: QueryKind::Keyword,
        }
    }

    /// The single row written when a query's retry budget ran out.
    pub fn sentinel(kind: QueryKind, raw_text: &str) -> Self {
        let (title, matched_word) = match kind {
            QueryKind::Keyword => (None, None),
            _ => (
                Some(NO_VALID_PRODUCT.to_string()),
                Some(NO_MATCH_LABEL.to_string()),
            ),
        };
        Self {
            asin: NO_VALID_PRODUCT.to_string(),
            brand_name_or_keyword: raw_text.to_string(),
            title,
            link: Some(NO_VALID_PRODUCT.to_string()),
            matched_word,
            status: RecordStatus::NoValidProduct,
            scraped_at: Utc::now(),
            kind,
        }
    }

    /// Sentinel row for a query that was never searched because nothing was
    /// left of it after cleaning.
    pub fn unsearchable(kind: QueryKind, raw_text: &str) -> Self {
        Self {
            status: RecordStatus::Failed,
            ..Self::sentinel(kind, raw_text)
        }
    }
}

impl Record for ResultRecord {
    fn headers(&self) -> &'static [&'static str] {
        match self.kind {
            QueryKind::Keyword => KEYWORD_HEADERS,
            _ => BRAND_HEADERS,
        }
    }
}

/// Outcome of a detail-page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    Success,
    Failed,
}

/// One row of the product details file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRecord {
    pub asin: String,
    pub searched_brand: String,
    pub product_title: String,
    /// Breadcrumbs joined with " > ".
    pub breadcrumbs: String,
    pub brand_info: String,
    pub link: String,
    pub scraped_at: DateTime<Utc>,
    pub status: ScrapeStatus,
}

impl DetailRecord {
    pub const BREADCRUMB_SEPARATOR: &'static str = " > ";

    pub fn success(
        asin: &str,
        searched_brand: &str,
        link: &str,
        detail: crate::session::RawDetail,
    ) -> Self {
        let brand_info = detail
            .byline
            .as_deref()
            .map(|b| b.replace("Brand: ", "").trim().to_string())
            .unwrap_or_default();

        Self {
            asin: asin.to_string(),
            searched_brand: searched_brand.to_string(),
            product_title: detail.title,
            breadcrumbs: detail.breadcrumbs.join(Self::BREADCRUMB_SEPARATOR),
            brand_info,
            link: link.to_string(),
            scraped_at: Utc::now(),
            status: ScrapeStatus::Success,
        }
    }

    pub fn failed(asin: &str, searched_brand: &str, link: &str) -> Self {
        Self {
            asin: asin.to_string(),
            searched_brand: searched_brand.to_string(),
            product_title: FAILED_TO_SCRAPE.to_string(),
            breadcrumbs: FAILED_TO_SCRAPE.to_string(),
            brand_info: FAILED_TO_SCRAPE.to_string(),
            link: link.to_string(),
            scraped_at: Utc::now(),
            status: ScrapeStatus::Failed,
        }
    }
}

impl Record for DetailRecord {
    fn headers(&self) -> &'static [&'static str] {
        &[
            "asin",
            "searchedBrand",
            "productTitle",
            "breadcrumbs",
            "brandInfo",
            "link",
            "scrapedAt",
            "status",
        ]
    }
}

/// One row of the keyword-ASIN brand name file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandNameRecord {
    pub asin: String,
    pub keyword_name: String,
    pub product_url: String,
    /// Empty when the brand could not be found.
    pub brand_name: String,
    pub status: ScrapeStatus,
}

impl BrandNameRecord {
    pub fn new(asin: &str, keyword_name: &str, product_url: &str, brand: Option<String>) -> Self {
        let brand_name = brand.unwrap_or_default();
        let status = if brand_name.is_empty() {
            ScrapeStatus::Failed
        } else {
            ScrapeStatus::Success
        };
        Self {
            asin: asin.to_string(),
            keyword_name: keyword_name.to_string(),
            product_url: product_url.to_string(),
            brand_name,
            status,
        }
    }
}

impl Record for BrandNameRecord {
    fn headers(&self) -> &'static [&'static str] {
        &["asin", "keywordName", "productUrl", "brandName", "status"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchResult;
    use crate::session::RawDetail;

    fn candidate() -> RawCandidate {
        RawCandidate {
            asin: "B0TEST0001".to_string(),
            title: "Acme Widget".to_string(),
            brand_text: "Acme".to_string(),
            link: "https://shop.example/dp/B0TEST0001".to_string(),
        }
    }

    #[test]
    fn test_matched_record_uses_label() {
        let record = ResultRecord::matched(
            "Acme",
            MatchedCandidate {
                candidate: candidate(),
                result: MatchResult::partial("Acme", 1),
            },
        );
        assert_eq!(record.matched_word.as_deref(), Some("Word 1"));
        assert_eq!(record.status, RecordStatus::Success);
        assert_eq!(record.headers()[1], "brandName");
    }

    #[test]
    fn test_brand_sentinel() {
        let record = ResultRecord::sentinel(QueryKind::Brand, "Acme Corp.");
        assert_eq!(record.asin, NO_VALID_PRODUCT);
        assert_eq!(record.brand_name_or_keyword, "Acme Corp.");
        assert_eq!(record.title.as_deref(), Some(NO_VALID_PRODUCT));
        assert_eq!(record.link.as_deref(), Some(NO_VALID_PRODUCT));
        assert_eq!(record.matched_word.as_deref(), Some("no match"));
        assert_eq!(record.status, RecordStatus::NoValidProduct);
    }

    #[test]
    fn test_unsearchable_keeps_sentinel_fields() {
        let record = ResultRecord::unsearchable(QueryKind::Brand, "Inc. LLC");
        assert_eq!(record.asin, NO_VALID_PRODUCT);
        assert_eq!(record.brand_name_or_keyword, "Inc. LLC");
        assert_eq!(record.status, RecordStatus::Failed);
    }

    #[test]
    fn test_keyword_sentinel_has_only_asin_and_link() {
        let record = ResultRecord::sentinel(QueryKind::Keyword, "running shoes");
        assert_eq!(record.asin, NO_VALID_PRODUCT);
        assert!(record.title.is_none());
        assert!(record.matched_word.is_none());
        assert_eq!(record.headers()[1], "keywordName");
    }

    #[test]
    fn test_detail_success_strips_brand_prefix() {
        let detail = RawDetail {
            title: "Widget".to_string(),
            breadcrumbs: vec!["Home".to_string(), "Tools".to_string()],
            byline: Some("Brand: Acme".to_string()),
            brand: None,
        };
        let record = DetailRecord::success("B1", "Acme", "https://x/dp/B1", detail);
        assert_eq!(record.breadcrumbs, "Home > Tools");
        assert_eq!(record.brand_info, "Acme");
        assert_eq!(record.status, ScrapeStatus::Success);
    }

    #[test]
    fn test_detail_failure_fields() {
        let record = DetailRecord::failed("B1", "Acme", "https://x/dp/B1");
        assert_eq!(record.product_title, FAILED_TO_SCRAPE);
        assert_eq!(record.breadcrumbs, FAILED_TO_SCRAPE);
        assert_eq!(record.brand_info, FAILED_TO_SCRAPE);
        assert_eq!(record.status, ScrapeStatus::Failed);
    }

    #[test]
    fn test_brand_name_status_follows_brand() {
        let found = BrandNameRecord::new("B1", "socks", "https://x/dp/B1", Some("Acme".into()));
        assert_eq!(found.status, ScrapeStatus::Success);

        let missing = BrandNameRecord::new("B2", "socks", "https://x/dp/B2", None);
        assert_eq!(missing.brand_name, "");
        assert_eq!(missing.status, ScrapeStatus::Failed);
    }
}
