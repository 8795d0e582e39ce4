use crate::config::types::{Config, ExportConfig, PurgeConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Environment variable carrying the CDN zone id
pub const ENV_ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";

/// Environment variable carrying the CDN API token
pub const ENV_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";

/// Environment variable carrying the export webhook URL
pub const ENV_WEBHOOK_URL: &str = "APPS_SCRIPT_URL";

/// Loads, resolves and validates a configuration file from the given path
///
/// Environment overrides are read from the process environment.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use edge_warmer::config::load_config;
///
/// let config = load_config(Path::new("warmer.toml")).unwrap();
/// println!("Batch size: {}", config.warmer.batch_size);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] but with an injectable environment lookup
pub fn load_config_with_env<F>(path: &Path, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, env)
}

/// Parses TOML content, applies environment overrides and validates
pub fn parse_config<F>(content: &str, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(content)?;
    apply_env_overrides(&mut config, &env)?;
    validate(&config)?;
    Ok(config)
}

/// Fills credentials and proxy endpoints from the environment
///
/// Values present in the environment win over values in the file. A site
/// naming a `proxy-env` variable that is unset is a hard error: without a
/// proxy the site cannot be reached at all.
pub fn apply_env_overrides<F>(config: &mut Config, env: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let zone = lookup(ENV_ZONE_ID);
    let token = lookup(ENV_API_TOKEN);
    if zone.is_some() || token.is_some() {
        let purge = config.purge.get_or_insert_with(PurgeConfig::default);
        if zone.is_some() {
            purge.zone_id = zone;
        }
        if token.is_some() {
            purge.api_token = token;
        }
    }

    if let Some(webhook) = lookup(ENV_WEBHOOK_URL) {
        config
            .export
            .get_or_insert_with(ExportConfig::default)
            .webhook_url = Some(webhook);
    }

    for site in &mut config.sites {
        if let Some(var) = site.proxy_env.as_deref() {
            match lookup(var) {
                Some(proxy) => site.proxy = Some(proxy),
                None if site.proxy.is_some() => {
                    tracing::debug!(
                        "{} not set, keeping file proxy for site {}",
                        var,
                        site.code
                    );
                }
                None => return Err(ConfigError::MissingEnv(var.to_string())),
            }
        }
    }

    Ok(())
}
