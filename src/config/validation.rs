use crate::config::types::{Config, ExportConfig, PurgeConfig, SiteConfig, WarmerConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_warmer_config(&config.warmer)?;
    validate_sites(&config.sites)?;
    if let Some(purge) = &config.purge {
        validate_purge_config(purge)?;
    }
    if let Some(export) = &config.export {
        validate_export_config(export)?;
    }
    Ok(())
}

/// Validates warmer pacing and retry settings
fn validate_warmer_config(config: &WarmerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 50 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 50, got {}",
            config.batch_size
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.sitemap_timeout_secs == 0 || config.warm_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request timeouts must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Validates site entries: at least one, unique codes, reachable through a proxy
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for site in sites {
        if site.code.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site code cannot be empty".to_string(),
            ));
        }

        if !seen.insert(site.code.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site code '{}'",
                site.code
            )));
        }

        let base = Url::parse(&site.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", site.base_url, e))
        })?;
        if base.scheme() != "https" && base.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "base-url '{}' must use http or https",
                site.base_url
            )));
        }

        let proxy = site.proxy.as_deref().unwrap_or("");
        if proxy.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has no proxy configured",
                site.code
            )));
        }
        Url::parse(proxy).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy for site '{}': {}", site.code, e))
        })?;

        if site.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty user-agent",
                site.code
            )));
        }
    }

    Ok(())
}

/// Validates purge settings; partial credentials only disable purging
fn validate_purge_config(config: &PurgeConfig) -> Result<(), ConfigError> {
    Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid purge api-base: {}", e)))?;

    let has_zone = config.zone_id.as_deref().is_some_and(|z| !z.is_empty());
    let has_token = config.api_token.as_deref().is_some_and(|t| !t.is_empty());
    if has_zone != has_token {
        tracing::warn!("Purge needs both zone-id and api-token; purging is disabled");
    }

    Ok(())
}

/// Validates export webhook settings
fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if let Some(webhook) = config.webhook() {
        Url::parse(webhook)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webhook-url: {}", e)))?;
    }

    if !(20..=60).contains(&config.timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "export timeout_secs must be between 20 and 60, got {}",
            config.timeout_secs
        )));
    }

    if !(-12..=14).contains(&config.sheet_utc_offset_hours) {
        return Err(ConfigError::Validation(format!(
            "sheet_utc_offset_hours must be between -12 and 14, got {}",
            config.sheet_utc_offset_hours
        )));
    }

    Ok(())
}
