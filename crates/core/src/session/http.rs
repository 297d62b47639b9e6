//! HTTP fetch-and-parse session.
//!
//! Drives the retail site with plain HTTP requests over a cookie-keeping
//! client and extracts data with CSS selectors. Cookies persist across calls,
//! so the delivery region chosen once applies to every later search.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::SessionConfig;

use super::selectors::{parse_product_detail, parse_search_results};
use super::{AutomationSession, RawCandidate, RawDetail, SessionError, SessionProfile, Viewport};

const VIEWPORT_WIDTH: HeaderName = HeaderName::from_static("viewport-width");

/// Build a desktop Chrome user agent with a randomized major version (100-109).
pub fn random_user_agent() -> String {
    format!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/{}.0.0.0 Safari/537.36",
        fastrand::u32(100..110)
    )
}

/// Body of the address-change call that sets the delivery zip code.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressChangeRequest<'a> {
    location_type: &'a str,
    zip_code: &'a str,
    store_context: &'a str,
    device_type: &'a str,
    page_type: &'a str,
    action_source: &'a str,
}

impl<'a> AddressChangeRequest<'a> {
    fn zip_code(code: &'a str) -> Self {
        Self {
            location_type: "LOCATION_INPUT",
            zip_code: code,
            store_context: "generic",
            device_type: "web",
            page_type: "Search",
            action_source: "glow",
        }
    }
}

/// Session backed by `reqwest` and `scraper`.
pub struct HttpSession {
    client: Client,
    base_url: Url,
    profile: RwLock<SessionProfile>,
}

impl HttpSession {
    /// Create a session from configuration.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SessionError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .gzip(true)
            .build()
            .map_err(|e| SessionError::Setup(e.to_string()))?;

        let profile = SessionProfile {
            locale: config.locale.clone(),
            viewport: Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
            },
            user_agent: config.user_agent.clone().unwrap_or_else(random_user_agent),
        };

        Ok(Self {
            client,
            base_url,
            profile: RwLock::new(profile),
        })
    }

    /// URL of the search results page for a query.
    pub fn search_url(&self, query: &str) -> String {
        format!("{}/s?k={}", self.origin(), urlencoding::encode(query))
    }

    fn origin(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    async fn headers(&self) -> Result<HeaderMap, SessionError> {
        let profile = self.profile.read().await;
        let mut headers = HeaderMap::new();

        let header = |value: &str| {
            HeaderValue::from_str(value).map_err(|e| SessionError::Setup(e.to_string()))
        };
        headers.insert(USER_AGENT, header(&profile.user_agent)?);
        headers.insert(ACCEPT_LANGUAGE, header(&profile.locale)?);
        headers.insert(VIEWPORT_WIDTH, header(&profile.viewport.width.to_string())?);
        Ok(headers)
    }

    /// GET a page and return its body.
    async fn navigate(&self, url: &str) -> Result<String, SessionError> {
        debug!(url = url, "Navigating");

        let response = self
            .client
            .get(url)
            .headers(self.headers().await?)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, url))
    }
}

fn classify_transport_error(err: reqwest::Error, url: &str) -> SessionError {
    if err.is_timeout() {
        SessionError::NavigationTimeout(url.to_string())
    } else {
        SessionError::ConnectionFailed(err.to_string())
    }
}

#[async_trait]
impl AutomationSession for HttpSession {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(&self, query: &str) -> Result<Vec<RawCandidate>, SessionError> {
        let url = self.search_url(query);
        let html = self.navigate(&url).await?;
        let candidates = parse_search_results(&html, self.origin())?;
        debug!(query = query, found = candidates.len(), "Search page parsed");
        Ok(candidates)
    }

    async fn fetch_detail(&self, url: &str) -> Result<RawDetail, SessionError> {
        let html = self.navigate(url).await?;
        parse_product_detail(&html)
    }

    async fn configure(&self, profile: SessionProfile) -> Result<(), SessionError> {
        HeaderValue::from_str(&profile.user_agent)
            .map_err(|e| SessionError::Setup(format!("user agent: {}", e)))?;
        HeaderValue::from_str(&profile.locale)
            .map_err(|e| SessionError::Setup(format!("locale: {}", e)))?;

        *self.profile.write().await = profile;
        Ok(())
    }

    async fn set_delivery_region(&self, code: &str) -> Result<(), SessionError> {
        // Landing on a search page first picks up the session cookies the
        // address endpoint expects.
        self.navigate(&self.search_url("NIKE")).await?;

        let url = format!(
            "{}/portal-migration/hz/glow/address-change?actionSource=glow",
            self.origin()
        );
        let response = self
            .client
            .post(&url)
            .headers(self.headers().await?)
            .json(&AddressChangeRequest::zip_code(code))
            .send()
            .await
            .map_err(|e| classify_transport_error(e, &url))?;

        if !response.status().is_success() {
            return Err(SessionError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        info!(code = code, "Delivery region set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            base_url: "https://shop.example/".to_string(),
            user_agent: Some("test-agent".to_string()),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_random_user_agent_version_range() {
        for _ in 0..20 {
            let ua = random_user_agent();
            let version: u32 = ua
                .split("Chrome/")
                .nth(1)
                .and_then(|rest| rest.split('.').next())
                .and_then(|v| v.parse().ok())
                .unwrap();
            assert!((100..110).contains(&version));
        }
    }

    #[test]
    fn test_search_url_encodes_query() {
        let session = HttpSession::new(&config()).unwrap();
        assert_eq!(
            session.search_url("Ben & Jerry's"),
            "https://shop.example/s?k=Ben%20%26%20Jerry%27s"
        );
    }

    #[test]
    fn test_address_change_body_escapes_zip_code() {
        let body = serde_json::to_value(AddressChangeRequest::zip_code("1000\"1")).unwrap();
        assert_eq!(body["zipCode"], "1000\"1");
        assert_eq!(body["locationType"], "LOCATION_INPUT");
        assert_eq!(body["actionSource"], "glow");

        let raw = serde_json::to_string(&AddressChangeRequest::zip_code("10001")).unwrap();
        assert!(raw.contains(r#""zipCode":"10001""#));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = SessionConfig {
            base_url: "not a url".to_string(),
            ..SessionConfig::default()
        };
        assert!(matches!(
            HttpSession::new(&config),
            Err(SessionError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_configure_rejects_unencodable_header() {
        let session = HttpSession::new(&config()).unwrap();
        let result = session
            .configure(SessionProfile {
                locale: "en-US".to_string(),
                viewport: Viewport {
                    width: 1280,
                    height: 800,
                },
                user_agent: "bad\nagent".to_string(),
            })
            .await;
        assert!(matches!(result, Err(SessionError::Setup(_))));
    }

    #[tokio::test]
    async fn test_configure_updates_headers() {
        let session = HttpSession::new(&config()).unwrap();
        session
            .configure(SessionProfile {
                locale: "de-DE".to_string(),
                viewport: Viewport {
                    width: 1920,
                    height: 1080,
                },
                user_agent: "agent/2".to_string(),
            })
            .await
            .unwrap();

        let headers = session.headers().await.unwrap();
        assert_eq!(headers[USER_AGENT], "agent/2");
        assert_eq!(headers[ACCEPT_LANGUAGE], "de-DE");
        assert_eq!(headers[VIEWPORT_WIDTH], "1920");
    }
}
