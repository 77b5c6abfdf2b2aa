//! Configuration module for the review scraper
//!
//! This module handles loading, merging, and validating TOML configuration
//! files. Every section has defaults, so a run can be configured from the
//! command line alone.
//!
//! # Example
//!
//! ```no_run
//! use hotel_review_scraper::config::{finalize, load_config, Overrides};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! let config = finalize(config, Overrides::default()).unwrap();
//! println!("Scraping at most {:?} reviews", config.target.max_items);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DedupKeyPolicy, FetchConfig, OutputConfig, OutputFormat, PaginationConfig,
    ProxyConfig, RetryConfig, TargetConfig,
};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, finalize, load_config, load_config_with_hash, Overrides,
};
pub use validation::validate;
