//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building the HTTP client (headers, timeout, compression, proxy)
//! - Spacing requests by the configured minimum delay
//! - Classifying failures into timeouts, HTTP errors and anti-automation
//!   blocks, each flagged as retriable or not
//!
//! Retrying is the pagination controller's job: `fetch` performs exactly one
//! request per call.

use crate::config::{Config, ProxyConfig};
use crate::crawler::cursor::PageCursor;
use crate::ConfigError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client, Proxy, Response, StatusCode};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Lowercase body fragments that identify an interstitial challenge page
const CHALLENGE_MARKERS: &[&str] = &[
    "challenge-platform",
    "cf-chl-",
    "px-captcha",
    "captcha-delivery",
    "awswafintegration",
    "<title>just a moment",
    "<title>attention required",
    "<title>access denied",
];

/// Response header set by AWS WAF when it serves a challenge instead of content
const WAF_ACTION_HEADER: &str = "x-amzn-waf-action";

/// Request behavior for one run
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Per-request timeout
    pub timeout: Duration,

    /// Minimum time between the start of two requests
    pub min_delay: Duration,

    pub user_agent: String,
    pub accept_language: String,
    pub proxy: Option<ProxyConfig>,
}

impl FetchPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.fetch.timeout(),
            min_delay: config.fetch.min_delay(),
            user_agent: config.fetch.user_agent.clone(),
            accept_language: config.fetch.accept_language.clone(),
            proxy: config.proxy.clone(),
        }
    }
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Page body content
    pub body: String,
}

/// Failure class of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    HttpError,
    /// The site answered with an anti-automation challenge
    Blocked,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::HttpError => "http error",
            Self::Blocked => "blocked",
        };
        f.write_str(name)
    }
}

/// A failed page request
#[derive(Debug, Clone, Error)]
#[error("{kind} fetching {url}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,

    /// Whether repeating the request may succeed
    pub retriable: bool,

    /// HTTP status, when a response was received
    pub status: Option<u16>,

    pub url: String,
    pub message: String,
}

impl FetchError {
    fn new(kind: FetchErrorKind, retriable: bool, url: &Url, message: impl Into<String>) -> Self {
        Self {
            kind,
            retriable,
            status: None,
            url: url.to_string(),
            message: message.into(),
        }
    }

    fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }

    fn blocked(url: &Url, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Blocked, true, url, message)
    }
}

/// Builds an HTTP client from the fetch policy
///
/// Fails with `ConfigError::InvalidProxy` when the proxy endpoint is not
/// usable, before any request is made.
///
/// # Example
///
/// ```
/// use hotel_review_scraper::config::Config;
/// use hotel_review_scraper::crawler::{build_http_client, FetchPolicy};
///
/// let policy = FetchPolicy::from_config(&Config::default());
/// let client = build_http_client(&policy).unwrap();
/// ```
pub fn build_http_client(policy: &FetchPolicy) -> Result<Client, ConfigError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&policy.accept_language).map_err(|e| {
            ConfigError::Validation(format!("Invalid accept_language header value: {}", e))
        })?,
    );

    let mut builder = Client::builder()
        .user_agent(policy.user_agent.clone())
        .default_headers(headers)
        .timeout(policy.timeout)
        .connect_timeout(policy.timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy_config) = &policy.proxy {
        let mut proxy = Proxy::all(&proxy_config.endpoint)
            .map_err(|e| ConfigError::InvalidProxy(format!("{}: {}", proxy_config.endpoint, e)))?;
        if let Some(username) = &proxy_config.username {
            proxy = proxy.basic_auth(username, proxy_config.password.as_deref().unwrap_or(""));
        }
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {}", e)))
}

/// Issues page requests under the run's rate limit
///
/// The time of the last request lives here rather than in any global, so
/// runs for different hotels do not slow each other down.
pub struct PageFetcher {
    client: Client,
    min_delay: Duration,
    last_request: Option<Instant>,
}

impl PageFetcher {
    pub fn new(policy: &FetchPolicy) -> Result<Self, ConfigError> {
        Ok(Self::with_client(build_http_client(policy)?, policy.min_delay))
    }

    pub fn with_client(client: Client, min_delay: Duration) -> Self {
        Self {
            client,
            min_delay,
            last_request: None,
        }
    }

    /// Fetches the page the cursor points at
    ///
    /// # Classification
    ///
    /// | Condition | Kind | Retriable |
    /// |-----------|------|-----------|
    /// | Request or body timeout, HTTP 408 | Timeout | yes |
    /// | HTTP 403 / 429, challenge page or WAF header | Blocked | yes |
    /// | HTTP 5xx, connection failure | HttpError | yes |
    /// | Other HTTP 4xx, redirect errors | HttpError | no |
    pub async fn fetch(&mut self, cursor: &PageCursor) -> Result<RawPage, FetchError> {
        self.wait_for_slot().await;

        let url = cursor.url();
        tracing::debug!("Fetching page {}: {}", cursor.page(), url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))?;

        let status = response.status();
        let final_url = response.url().clone();
        check_status(url, &response)?;

        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(url, &e).with_status(status))?;

        if is_challenge_page(&body) {
            return Err(FetchError::blocked(url, "challenge page served instead of reviews")
                .with_status(status));
        }

        Ok(RawPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }

    /// Sleeps until the minimum delay since the previous request has passed
    async fn wait_for_slot(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                let wait = self.min_delay - elapsed;
                tracing::trace!("Rate limit: waiting {:?} before next request", wait);
                tokio::time::sleep(wait).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Maps a non-success response to a fetch error
fn check_status(url: &Url, response: &Response) -> Result<(), FetchError> {
    let status = response.status();

    let waf_challenge = response
        .headers()
        .get(WAF_ACTION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.eq_ignore_ascii_case("challenge") || v.eq_ignore_ascii_case("captcha"));
    if waf_challenge {
        return Err(FetchError::blocked(url, "WAF challenge header present").with_status(status));
    }

    if status.is_success() {
        return Ok(());
    }

    let error = match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
            FetchError::blocked(url, format!("HTTP {}", status.as_u16()))
        }
        StatusCode::REQUEST_TIMEOUT => FetchError::new(
            FetchErrorKind::Timeout,
            true,
            url,
            format!("HTTP {}", status.as_u16()),
        ),
        s if s.is_server_error() => FetchError::new(
            FetchErrorKind::HttpError,
            true,
            url,
            format!("HTTP {}", s.as_u16()),
        ),
        s => FetchError::new(
            FetchErrorKind::HttpError,
            false,
            url,
            format!("HTTP {}", s.as_u16()),
        ),
    };

    Err(error.with_status(status))
}

/// Classifies a transport-level error
fn classify_request_error(url: &Url, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::new(FetchErrorKind::Timeout, true, url, "Request timeout")
    } else if error.is_redirect() {
        FetchError::new(FetchErrorKind::HttpError, false, url, error.to_string())
    } else if error.is_connect() {
        FetchError::new(FetchErrorKind::HttpError, true, url, "Connection failed")
    } else {
        FetchError::new(FetchErrorKind::HttpError, true, url, error.to_string())
    }
}

/// Heuristic detection of anti-automation interstitials
pub fn is_challenge_page(body: &str) -> bool {
    let lowered = body.to_lowercase();
    CHALLENGE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
