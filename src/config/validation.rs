use crate::config::types::{BrowserSettings, Config, CrawlerConfig, OutputConfig, ScopeConfig};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scope_config(&config.scope)?;
    validate_crawler_config(&config.crawler)?;
    validate_browser_settings(&config.browser)?;
    validate_output_config(&config.output)?;
    validate_start_url(config)?;
    Ok(())
}

/// Validates scope configuration
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if config.base_host.is_empty() {
        return Err(ConfigError::Validation(
            "base_host cannot be empty".to_string(),
        ));
    }

    if config.base_host.contains("://") || config.base_host.contains('/') {
        return Err(ConfigError::Validation(format!(
            "base_host must be a bare host (optionally with port), got '{}'",
            config.base_host
        )));
    }

    if !config.path_prefix.is_empty() && !config.path_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "path_prefix must start with '/', got '{}'",
            config.path_prefix
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.rate_limit_delay.is_finite() || config.rate_limit_delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "rate_limit_delay must be a non-negative number of seconds, got {}",
            config.rate_limit_delay
        )));
    }

    if Duration::try_from_secs_f64(config.rate_limit_delay).is_err() {
        return Err(ConfigError::Validation(format!(
            "rate_limit_delay is too large, got {}",
            config.rate_limit_delay
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates browser settings
fn validate_browser_settings(config: &BrowserSettings) -> Result<(), ConfigError> {
    if config.navigation_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout must be >= 1s, got {}s",
            config.navigation_timeout
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that the seed URL parses and lies inside the scope
fn validate_start_url(config: &Config) -> Result<(), ConfigError> {
    let url = Url::parse(&config.scope.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid start URL '{}': {}",
            config.scope.start_url, e
        ))
    })?;

    let scope = config.scope();
    if !scope.contains(&url) {
        return Err(ConfigError::SeedOutOfScope {
            url: config.scope.start_url.clone(),
            scope: scope.to_string(),
        });
    }

    Ok(())
}
