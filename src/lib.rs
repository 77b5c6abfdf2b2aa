//! Hotel review scraper: a paginated review-listing extraction engine
//!
//! This crate walks the review pages of a single hotel listing, parses each
//! page into structured review records, de-duplicates and caps the result set,
//! and streams the accepted records to the caller one at a time.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Errors of a scrape run as seen by its caller
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scrape task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
///
/// Every variant is fatal at startup: it is raised before the first page is
/// requested.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ReviewScraper, ReviewStream};
pub use model::{HotelStats, ReviewItem, ReviewRecord};
pub use output::RunSummary;
pub use state::{ControllerState, RunStatus};
