use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub pipelines: PipelinesConfig,
    #[serde(default)]
    pub dedupe: DedupeConfig,
}

impl Config {
    /// Resolve a pipeline's effective settings: overrides from the file on
    /// top of the built-in defaults for that pipeline.
    pub fn pipeline(&self, kind: PipelineKind) -> PipelineConfig {
        let overrides = self.pipelines.get(kind);
        let defaults = PipelineConfig::defaults_for(kind);

        PipelineConfig {
            kind,
            max_attempts: overrides.max_attempts.unwrap_or(defaults.max_attempts),
            backoff_base_ms: overrides.backoff_base_ms.unwrap_or(defaults.backoff_base_ms),
            backoff_jitter_ms: overrides
                .backoff_jitter_ms
                .unwrap_or(defaults.backoff_jitter_ms),
            cooldown_ms: overrides.cooldown_ms.unwrap_or(defaults.cooldown_ms),
            input: overrides.input.clone().unwrap_or(defaults.input),
            output: overrides.output.clone().unwrap_or(defaults.output),
            input_column: overrides
                .input_column
                .clone()
                .unwrap_or(defaults.input_column),
        }
    }
}

/// Automation session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Site origin, e.g. "https://www.amazon.com"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Accept-Language value
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// Fixed user agent. A randomized Chrome UA is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Delivery zip/pin code applied once per run (best effort).
    /// An empty string turns the region step off.
    #[serde(
        default = "default_delivery_region",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery_region: Option<String>,
    /// Per-request timeout in seconds (default: 60)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            locale: default_locale(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            user_agent: None,
            delivery_region: default_delivery_region(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SessionConfig {
    /// The delivery region to apply, if any.
    pub fn delivery_region_code(&self) -> Option<&str> {
        self.delivery_region
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

fn default_base_url() -> String {
    "https://www.amazon.com".to_string()
}

fn default_locale() -> String {
    "en-IN,en;q=0.9".to_string()
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_delivery_region() -> Option<String> {
    Some("10001".to_string())
}

fn default_timeout() -> u64 {
    60
}

/// The session-driven pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Company names to matched products
    Brands,
    /// Keywords to product links
    Keywords,
    /// Re-run brands that produced only a sentinel row
    RetryInvalid,
    /// Product pages to breadcrumbs and brand info
    Details,
    /// Keyword-map ASINs to brand names
    BrandNames,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 5] = [
        PipelineKind::Brands,
        PipelineKind::Keywords,
        PipelineKind::RetryInvalid,
        PipelineKind::Details,
        PipelineKind::BrandNames,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Brands => "brands",
            PipelineKind::Keywords => "keywords",
            PipelineKind::RetryInvalid => "retry_invalid",
            PipelineKind::Details => "details",
            PipelineKind::BrandNames => "brand_names",
        }
    }

    /// Search pipelines pin the delivery region before the first query.
    pub fn uses_delivery_region(&self) -> bool {
        matches!(
            self,
            PipelineKind::Brands | PipelineKind::Keywords | PipelineKind::RetryInvalid
        )
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[pipelines.*]` sections. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PipelinesConfig {
    #[serde(default)]
    pub brands: PipelineOverrides,
    #[serde(default)]
    pub keywords: PipelineOverrides,
    #[serde(default)]
    pub retry_invalid: PipelineOverrides,
    #[serde(default)]
    pub details: PipelineOverrides,
    #[serde(default)]
    pub brand_names: PipelineOverrides,
}

impl PipelinesConfig {
    pub fn get(&self, kind: PipelineKind) -> &PipelineOverrides {
        match kind {
            PipelineKind::Brands => &self.brands,
            PipelineKind::Keywords => &self.keywords,
            PipelineKind::RetryInvalid => &self.retry_invalid,
            PipelineKind::Details => &self.details,
            PipelineKind::BrandNames => &self.brand_names,
        }
    }
}

/// Per-pipeline overrides as written in the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PipelineOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_base_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_jitter_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_column: Option<String>,
}

/// Effective settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub kind: PipelineKind,
    /// Attempt budget per query
    pub max_attempts: u32,
    /// Fixed part of the pause between attempts
    pub backoff_base_ms: u64,
    /// Upper bound of the random part of the pause between attempts
    pub backoff_jitter_ms: u64,
    /// Pause after every processed query
    pub cooldown_ms: u64,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Column holding the brand or keyword in the input file
    pub input_column: String,
}

impl PipelineConfig {
    /// Built-in defaults for a pipeline.
    pub fn defaults_for(kind: PipelineKind) -> Self {
        let (max_attempts, backoff_base_ms, backoff_jitter_ms, input, output, input_column) =
            match kind {
                PipelineKind::Brands => (
                    100,
                    2000,
                    0,
                    "data/company_name_deduped.csv",
                    "data/brand_asin_map.csv",
                    "Company Names",
                ),
                PipelineKind::Keywords => (
                    3,
                    2000,
                    0,
                    "data/keyword_brand_scrap.csv",
                    "data/brand_keyword_map.csv",
                    "Keywords",
                ),
                PipelineKind::RetryInvalid => (
                    5,
                    2000,
                    0,
                    "data/brand_asin_map.csv",
                    "data/brand_asin_retry.csv",
                    "brandName",
                ),
                PipelineKind::Details => (
                    100,
                    2000,
                    2000,
                    "data/brand_asin_map.csv",
                    "data/amazon_product_details.csv",
                    "brandName",
                ),
                PipelineKind::BrandNames => (
                    100,
                    1000,
                    1000,
                    "data/brand_keyword_map.csv",
                    "data/brandName_for_keywords.csv",
                    "keywordName",
                ),
            };

        Self {
            kind,
            max_attempts,
            backoff_base_ms,
            backoff_jitter_ms,
            cooldown_ms: 3000,
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            input_column: input_column.to_string(),
        }
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_jitter(&self) -> Duration {
        Duration::from_millis(self.backoff_jitter_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Input list deduplication utility
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DedupeConfig {
    #[serde(default = "default_dedupe_input")]
    pub input: PathBuf,
    /// Unique values, one per row
    #[serde(default = "default_dedupe_output")]
    pub output: PathBuf,
    /// Values seen more than once
    #[serde(default = "default_duplicates_output")]
    pub duplicates_output: PathBuf,
    #[serde(default = "default_dedupe_column")]
    pub column: String,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            input: default_dedupe_input(),
            output: default_dedupe_output(),
            duplicates_output: default_duplicates_output(),
            column: default_dedupe_column(),
        }
    }
}

fn default_dedupe_input() -> PathBuf {
    PathBuf::from("data/ICP_data_scrapping.csv")
}

fn default_dedupe_output() -> PathBuf {
    PathBuf::from("data/company_name_deduped.csv")
}

fn default_duplicates_output() -> PathBuf {
    PathBuf::from("data/duplicate_company_names.csv")
}

fn default_dedupe_column() -> String {
    "Company Names".to_string()
}
