use crate::config::types::{ClientConfig, Config, CrawlConfig, CredentialEntry};
use crate::model::Filter;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_crawl_config(&config.crawl)?;
    validate_credentials(&config.credentials)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs > 600 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be <= 600, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 || config.connect_timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be between 1 and 120, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.auth_probe_timeout_secs < 1 || config.auth_probe_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "auth_probe_timeout_secs must be between 1 and 300, got {}",
            config.auth_probe_timeout_secs
        )));
    }

    if let Some(proxy) = &config.proxy_url {
        validate_proxy_url(proxy)?;
    }

    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    Filter::from_names(&config.filter)?;

    if config.max_depth > 16 {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= 16, got {}",
            config.max_depth
        )));
    }

    if let Some(username) = &config.username {
        if username.trim().is_empty() {
            return Err(ConfigError::Validation(
                "username cannot be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates credential entries
fn validate_credentials(entries: &[CredentialEntry]) -> Result<(), ConfigError> {
    for entry in entries {
        validate_host_pattern(&entry.host)?;

        if entry.token.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Credential for '{}' has an empty token",
                entry.host
            )));
        }
    }

    Ok(())
}

/// Validates that a proxy URL is an absolute http(s) URL
pub(crate) fn validate_proxy_url(proxy: &str) -> Result<(), ConfigError> {
    let url = Url::parse(proxy)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy_url '{}': {}", proxy, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "proxy_url '{}' must use http or https",
            proxy
        )));
    }

    Ok(())
}

/// Validates a host pattern (supports a leading "*." wildcard)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let host = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_host_string(host)
}

/// Validates a host string (without wildcard prefix)
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern("Host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}
