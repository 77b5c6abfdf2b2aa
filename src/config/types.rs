use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for a scrape run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub fetch: FetchConfig,
    pub retry: RetryConfig,
    pub pagination: PaginationConfig,
    pub proxy: Option<ProxyConfig>,
    pub output: OutputConfig,
}

/// What to scrape and how much of it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// The hotel's review listing URL
    pub url: String,

    /// Cap on total emitted records (absent means unbounded)
    #[serde(rename = "max-items")]
    pub max_items: Option<usize>,

    /// ISO-639 codes to keep (empty means all languages)
    pub languages: Vec<String>,
}

/// Per-request HTTP behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Minimum time between two requests (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            min_delay_ms: 1000,
            user_agent: "HotelReviewScraper/1.0".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}

/// Retry budget and backoff for a single page
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per page, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles per attempt
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Upper bound for any single backoff delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Extra factor applied to the delay after an anti-automation block
    #[serde(rename = "blocked-multiplier")]
    pub blocked_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            blocked_multiplier: 4,
        }
    }
}

/// Which review fields identify a duplicate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupKeyPolicy {
    /// Guest name, review date and title
    #[default]
    NameDateTitle,

    /// Guest name, review date, title and both review texts
    NameDateTitleContent,
}

/// Pagination termination and buffering policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Parsed pages in a row without a new record before giving up
    #[serde(rename = "stall-pages")]
    pub stall_pages: u32,

    /// Unparseable pages in a row that end the run with a partial failure
    #[serde(rename = "max-consecutive-parse-failures")]
    pub max_consecutive_parse_failures: u32,

    /// Records per page, used to advance an offset cursor when the site
    /// offers no next link
    #[serde(rename = "page-size")]
    pub page_size: Option<u32>,

    #[serde(rename = "dedup-key")]
    pub dedup_key: DedupKeyPolicy,

    /// Accepted records buffered ahead of a slow consumer
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            stall_pages: 2,
            max_consecutive_parse_failures: 3,
            page_size: None,
            dedup_key: DedupKeyPolicy::default(),
            channel_capacity: 64,
        }
    }
}

/// Outbound proxy
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Export format of the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single JSON array
    #[default]
    Json,

    /// One JSON object per line
    Jsonl,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "data/reviews.json".to_string(),
            format: OutputFormat::Json,
        }
    }
}
