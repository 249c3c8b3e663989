use std::collections::HashSet;

use reqwest::Url;

use super::{types::Config, ConfigError, MAX_RETENTION_SECS};

/// Validate configuration
/// Currently validates:
/// - Search timeout and query concurrency are not 0
/// - Cache retention is at most [`MAX_RETENTION_SECS`]
/// - Provider names are non-empty and unique (case-insensitive)
/// - Provider URLs are absolute http(s) URLs
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.search.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "search.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.search.max_concurrent_queries == 0 {
        return Err(ConfigError::ValidationError(
            "search.max_concurrent_queries cannot be 0".to_string(),
        ));
    }

    if config.cache.retention_secs > MAX_RETENTION_SECS {
        return Err(ConfigError::ValidationError(format!(
            "cache.retention_secs cannot exceed {}",
            MAX_RETENTION_SECS
        )));
    }

    let mut names = HashSet::new();
    for provider in &config.providers {
        let name = provider.name.trim();
        if name.is_empty() {
            return Err(ConfigError::ValidationError(
                "provider name cannot be empty".to_string(),
            ));
        }
        if !names.insert(name.to_lowercase()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate provider name: {}",
                name
            )));
        }

        let url = Url::parse(&provider.url).map_err(|e| {
            ConfigError::ValidationError(format!("provider {} has invalid url: {}", name, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "provider {} url must be http or https",
                name
            )));
        }
    }

    Ok(())
}
