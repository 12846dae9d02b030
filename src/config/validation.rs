use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, QualityConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

const MAX_CONCURRENCY: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_quality_config(&config.quality)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_root_url(&config.root_url)?;

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_delay < config.min_delay {
        return Err(ConfigError::Validation(format!(
            "max-delay ({}ms) must be >= min-delay ({}ms)",
            config.max_delay, config.min_delay
        )));
    }

    if config.request_timeout == 0 {
        return Err(ConfigError::Validation(
            "request-timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// The root URL must be an absolute http(s) URL with a host
fn validate_root_url(root_url: &str) -> Result<(), ConfigError> {
    if root_url.is_empty() {
        return Err(ConfigError::Validation(
            "root-url is required (set it in [crawler] or pass --root-url)".to_string(),
        ));
    }

    let url = Url::parse(root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root-url '{}': {}", root_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "root-url '{}' must use http or https",
            root_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "root-url '{}' has no host",
            root_url
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.robots_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "robots-name cannot be empty".to_string(),
        ));
    }

    if config.agents.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user agents cannot be empty strings".to_string(),
        ));
    }

    for proxy in &config.proxies {
        let url = Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;

        if !matches!(url.scheme(), "http" | "https" | "socks5" | "socks5h") {
            return Err(ConfigError::Validation(format!(
                "proxy '{}' has unsupported scheme '{}'",
                proxy,
                url.scheme()
            )));
        }
    }

    Ok(())
}

/// Validates quality gating configuration
fn validate_quality_config(config: &QualityConfig) -> Result<(), ConfigError> {
    if config
        .blacklist_patterns
        .iter()
        .any(|pattern| pattern.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "blacklist-patterns cannot contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
