use crate::config::types::{Config, OutputFormat, ProxyConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Values supplied on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub hotel_url: Option<String>,
    pub max_items: Option<usize>,
    pub languages: Vec<String>,
    pub output_path: Option<String>,
    pub format: Option<OutputFormat>,
    pub proxy: Option<String>,
}

/// Loads and parses a configuration file from the given path
///
/// The result is not validated yet: command-line overrides may still fill in
/// required values. Call [`finalize`] once overrides are applied.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use hotel_review_scraper::config::load_config;
///
/// let config = load_config(Path::new("scraper.toml")).unwrap();
/// println!("Target: {}", config.target.url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so an output file can be traced back to the settings
/// that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies command-line overrides on top of a loaded (or default) config
pub fn apply_overrides(mut config: Config, overrides: Overrides) -> Config {
    if let Some(url) = overrides.hotel_url {
        config.target.url = url;
    }
    if let Some(max_items) = overrides.max_items {
        config.target.max_items = Some(max_items);
    }
    if !overrides.languages.is_empty() {
        config.target.languages = overrides.languages;
    }
    if let Some(path) = overrides.output_path {
        config.output.path = path;
    }
    if let Some(format) = overrides.format {
        config.output.format = format;
    }
    if let Some(endpoint) = overrides.proxy {
        config.proxy = Some(ProxyConfig {
            endpoint,
            username: None,
            password: None,
        });
    }

    config.target.languages = config
        .target
        .languages
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(|code| code.trim().to_lowercase())
        .filter(|code| !code.is_empty())
        .collect();

    config
}

/// Applies overrides and validates the merged configuration
pub fn finalize(config: Config, overrides: Overrides) -> Result<Config, ConfigError> {
    let config = apply_overrides(config, overrides);
    validate(&config)?;
    Ok(config)
}
