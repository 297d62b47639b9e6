//! CSS selectors and page extraction for the retail site.
//!
//! Extraction is kept separate from transport so it can be exercised against
//! saved HTML. When the site changes its markup, update the selectors here.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{RawCandidate, RawDetail, SessionError};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Container of all search result cards. Missing on captcha/interstitial pages.
static RESULTS_SLOT: Lazy<Selector> = Lazy::new(|| selector("div.s-main-slot"));

/// One search result card carrying a `data-asin` attribute.
static RESULT_CARD: Lazy<Selector> =
    Lazy::new(|| selector("div.s-main-slot div.s-result-item[data-asin]"));

static CARD_TITLE: Lazy<Selector> = Lazy::new(|| selector("h2 span"));
static CARD_LINK: Lazy<Selector> = Lazy::new(|| selector("a.a-link-normal.s-no-outline"));
static CARD_BRAND: Lazy<Selector> =
    Lazy::new(|| selector(r#"div[data-cy="title-recipe"] h2 span"#));

static PRODUCT_TITLE: Lazy<Selector> = Lazy::new(|| selector("#productTitle"));
static BREADCRUMBS: Lazy<Selector> = Lazy::new(|| {
    selector("#wayfinding-breadcrumbs_feature_div ul.a-unordered-list li span.a-list-item a")
});
static BYLINE: Lazy<Selector> = Lazy::new(|| selector("#bylineInfo"));
static OVERVIEW_BRAND: Lazy<Selector> =
    Lazy::new(|| selector(".po-brand td.a-span9 span.a-size-base.po-break-word"));

static BYLINE_BRAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Brand:\s*(.+)").unwrap());

const ASIN_ATTR: &str = "data-asin";

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
}

/// Extract product cards from a search results page.
///
/// Cards without an ASIN, title or link are dropped. `origin` is prefixed to
/// relative product links.
pub fn parse_search_results(html: &str, origin: &str) -> Result<Vec<RawCandidate>, SessionError> {
    let document = Html::parse_document(html);

    if document.select(&RESULTS_SLOT).next().is_none() {
        return Err(SessionError::SelectorNotFound("div.s-main-slot".to_string()));
    }

    let origin = origin.trim_end_matches('/');
    let mut candidates = Vec::new();

    for card in document.select(&RESULT_CARD) {
        let asin = card.value().attr(ASIN_ATTR).unwrap_or_default().trim();
        let title = first_text(card, &CARD_TITLE).unwrap_or_default();
        let brand_text = first_text(card, &CARD_BRAND).unwrap_or_default();
        let href = card
            .select(&CARD_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default();

        if asin.is_empty() || title.is_empty() || href.is_empty() {
            continue;
        }

        let link = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", origin, href)
        };

        candidates.push(RawCandidate {
            asin: asin.to_string(),
            title,
            brand_text,
            link,
        });
    }

    Ok(candidates)
}

/// Extract details from a product page.
///
/// Fails with `SelectorNotFound` when the page has no product title, which is
/// what a captcha or error page looks like.
pub fn parse_product_detail(html: &str) -> Result<RawDetail, SessionError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = first_text(root, &PRODUCT_TITLE)
        .ok_or_else(|| SessionError::SelectorNotFound("#productTitle".to_string()))?;

    let breadcrumbs = document
        .select(&BREADCRUMBS)
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect();

    let byline = first_text(root, &BYLINE);
    let brand = first_text(root, &OVERVIEW_BRAND).or_else(|| {
        byline
            .as_deref()
            .and_then(|b| BYLINE_BRAND.captures(b))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|b| !b.is_empty())
    });

    Ok(RawDetail {
        title,
        breadcrumbs,
        byline,
        brand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
<html><body>
<div class="s-main-slot">
  <div class="s-result-item" data-asin="B000000001">
    <div data-cy="title-recipe"><h2><span>Nike</span></h2></div>
    <h2><span>Nike Air Zoom Pegasus</span></h2>
    <a class="a-link-normal s-no-outline" href="/Nike-Pegasus/dp/B000000001">img</a>
  </div>
  <div class="s-result-item" data-asin="">
    <h2><span>Sponsored banner</span></h2>
  </div>
  <div class="s-result-item" data-asin="B000000002">
    <h2><span>Generic   Running
      Socks</span></h2>
    <a class="a-link-normal s-no-outline" href="https://shop.example/dp/B000000002">img</a>
  </div>
  <div class="s-result-item" data-asin="B000000003">
    <h2><span>No link here</span></h2>
  </div>
</div>
</body></html>
"#;

    const DETAIL_PAGE: &str = r#"
<html><body>
<div id="wayfinding-breadcrumbs_feature_div">
  <ul class="a-unordered-list">
    <li><span class="a-list-item"><a href="/c1">Clothing, Shoes &amp; Jewelry</a></span></li>
    <li><span class="a-list-item">›</span></li>
    <li><span class="a-list-item"><a href="/c2"> Men </a></span></li>
  </ul>
</div>
<span id="productTitle">   Nike Air Zoom Pegasus 40  </span>
<a id="bylineInfo">Brand: Nike</a>
</body></html>
"#;

    #[test]
    fn test_parse_search_results() {
        let candidates = parse_search_results(SEARCH_PAGE, "https://shop.example/").unwrap();
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].asin, "B000000001");
        assert_eq!(candidates[0].brand_text, "Nike");
        assert_eq!(
            candidates[0].link,
            "https://shop.example/Nike-Pegasus/dp/B000000001"
        );

        assert_eq!(candidates[1].title, "Generic Running Socks");
        assert_eq!(candidates[1].brand_text, "");
        assert_eq!(candidates[1].link, "https://shop.example/dp/B000000002");
    }

    #[test]
    fn test_parse_search_results_without_slot_is_selector_failure() {
        let err = parse_search_results("<html><body>captcha</body></html>", "https://x").unwrap_err();
        assert!(matches!(err, SessionError::SelectorNotFound(_)));
    }

    #[test]
    fn test_parse_product_detail() {
        let detail = parse_product_detail(DETAIL_PAGE).unwrap();
        assert_eq!(detail.title, "Nike Air Zoom Pegasus 40");
        assert_eq!(detail.breadcrumbs, vec!["Clothing, Shoes & Jewelry", "Men"]);
        assert_eq!(detail.byline.as_deref(), Some("Brand: Nike"));
        assert_eq!(detail.brand.as_deref(), Some("Nike"));
    }

    #[test]
    fn test_overview_brand_wins_over_byline() {
        let html = r#"
<span id="productTitle">Thing</span>
<a id="bylineInfo">Visit the Acme Store</a>
<table><tr class="po-brand"><td>Brand</td>
<td class="a-span9"><span class="a-size-base po-break-word">ACME</span></td></tr></table>
"#;
        let detail = parse_product_detail(html).unwrap();
        assert_eq!(detail.brand.as_deref(), Some("ACME"));
        assert!(detail.breadcrumbs.is_empty());
    }

    #[test]
    fn test_byline_without_brand_prefix_gives_no_brand() {
        let html = r#"<span id="productTitle">Thing</span><a id="bylineInfo">Visit the Acme Store</a>"#;
        let detail = parse_product_detail(html).unwrap();
        assert!(detail.brand.is_none());
    }

    #[test]
    fn test_parse_product_detail_missing_title() {
        let err = parse_product_detail("<html><body>Robot check</body></html>").unwrap_err();
        assert!(matches!(err, SessionError::SelectorNotFound(_)));
    }
}
