use crate::config::types::{
    Config, FetchConfig, OutputConfig, PaginationConfig, ProxyConfig, RetryConfig, TargetConfig,
};
use crate::url::parse_target_url;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_fetch_config(&config.fetch)?;
    validate_retry_config(&config.retry)?;
    validate_pagination_config(&config.pagination)?;
    if let Some(proxy) = &config.proxy {
        validate_proxy_config(proxy)?;
    }
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target listing and result bounds
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "a hotel review URL must be provided (target.url or --hotel-url)".to_string(),
        ));
    }

    parse_target_url(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target url '{}': {}", config.url, e)))?;

    if config.max_items == Some(0) {
        return Err(ConfigError::Validation(
            "max_items must be >= 1 when set".to_string(),
        ));
    }

    for code in &config.languages {
        validate_language_code(code)?;
    }

    Ok(())
}

/// Validates HTTP request settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry budget
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.blocked_multiplier < 1 {
        return Err(ConfigError::Validation(
            "blocked_multiplier must be >= 1".to_string(),
        ));
    }

    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base_delay_ms ({}) cannot exceed max_delay_ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates pagination policy thresholds
fn validate_pagination_config(config: &PaginationConfig) -> Result<(), ConfigError> {
    if config.stall_pages < 1 {
        return Err(ConfigError::Validation(
            "stall_pages must be >= 1".to_string(),
        ));
    }

    if config.max_consecutive_parse_failures < 1 {
        return Err(ConfigError::Validation(
            "max_consecutive_parse_failures must be >= 1".to_string(),
        ));
    }

    if config.page_size == Some(0) {
        return Err(ConfigError::Validation(
            "page_size must be >= 1 when set".to_string(),
        ));
    }

    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(
            "channel_capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the proxy endpoint
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.endpoint).map_err(|e| {
        ConfigError::InvalidProxy(format!("Invalid proxy endpoint '{}': {}", config.endpoint, e))
    })?;

    if !matches!(url.scheme(), "http" | "https" | "socks5" | "socks5h") {
        return Err(ConfigError::InvalidProxy(format!(
            "Unsupported proxy scheme '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidProxy(format!(
            "Proxy endpoint '{}' has no host",
            config.endpoint
        )));
    }

    if config.password.is_some() && config.username.is_none() {
        return Err(ConfigError::InvalidProxy(
            "proxy password given without a username".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// ISO-639-1 or ISO-639-2 code, already lowercased
fn validate_language_code(code: &str) -> Result<(), ConfigError> {
    let valid = (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_lowercase());
    if !valid {
        return Err(ConfigError::Validation(format!(
            "Invalid language code '{}': expected a two or three letter ISO-639 code",
            code
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.target.url = "https://www.booking.com/reviews/nl/hotel/example.html".to_string();
        config
    }

    #[test]
    fn test_default_config_with_url_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_target() {
        let mut config = valid_config();
        config.target.url = "ftp://example.com/reviews".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_zero_max_items() {
        let mut config = valid_config();
        config.target.max_items = Some(0);
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_language_code() {
        assert!(validate_language_code("en").is_ok());
        assert!(validate_language_code("nld").is_ok());

        assert!(validate_language_code("").is_err());
        assert!(validate_language_code("e").is_err());
        assert!(validate_language_code("en-gb").is_err());
        assert!(validate_language_code("EN").is_err());
    }

    #[test]
    fn test_retry_budget_bounds() {
        let mut config = valid_config();
        config.retry.max_attempts = 0;
        assert!(validate(&config).is_err());

        config.retry.max_attempts = 5;
        config.retry.base_delay_ms = 60_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_proxy_validation() {
        let mut config = valid_config();
        config.proxy = Some(ProxyConfig {
            endpoint: "http://proxy.example.com:8080".to_string(),
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
        });
        assert!(validate(&config).is_ok());

        config.proxy = Some(ProxyConfig {
            endpoint: "not a url".to_string(),
            username: None,
            password: None,
        });
        assert!(matches!(validate(&config), Err(ConfigError::InvalidProxy(_))));

        config.proxy = Some(ProxyConfig {
            endpoint: "ftp://proxy.example.com".to_string(),
            username: None,
            password: None,
        });
        assert!(matches!(validate(&config), Err(ConfigError::InvalidProxy(_))));
    }
}
