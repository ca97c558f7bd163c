use crate::config::types::{ApiConfig, Config, CrawlConfig, OutputConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// GitHub refuses larger listing pages
const MAX_PER_PAGE: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawl_config(&config.crawl)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "base-url must not end with '/', got '{}'",
            config.base_url
        )));
    }

    if config.token_path.is_empty() {
        return Err(ConfigError::Validation(
            "token-path cannot be empty".to_string(),
        ));
    }

    if config.per_page < 1 || config.per_page > MAX_PER_PAGE {
        return Err(ConfigError::Validation(format!(
            "per-page must be between 1 and {}, got {}",
            MAX_PER_PAGE, config.per_page
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the crawl id range
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.floor < 0 {
        return Err(ConfigError::Validation(format!(
            "floor must be >= 0, got {}",
            config.floor
        )));
    }

    if config.ceiling <= config.floor {
        return Err(ConfigError::Validation(format!(
            "ceiling ({}) must be greater than floor ({})",
            config.ceiling, config.floor
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.connect_retry_delay_ms == 0 {
        return Err(ConfigError::Validation(
            "connect-retry-delay-ms must be > 0".to_string(),
        ));
    }

    // Reset times are whole seconds from a remote clock
    if config.rate_limit_margin_secs < 1 {
        return Err(ConfigError::Validation(
            "rate-limit-margin-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
