//! CDN purge trigger
//!
//! A purge is fire-and-forget from the caller's point of view: failures are
//! logged and swallowed so they never affect the warm record of a URL.

mod cloudflare;

pub use cloudflare::CloudflarePurger;

use crate::config::Config;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a purge request
#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("Purge request failed: {0}")]
    Http(String),

    #[error("Purge API answered with status code {0}")]
    Status(u16),

    #[error("Purge API reported failure: {0}")]
    Rejected(String),
}

/// Asks the CDN to drop its cached copy of a URL
#[async_trait]
pub trait CachePurger: Send + Sync {
    /// Requests a purge of exactly `url`; never fails
    async fn purge(&self, url: &str);

    /// Whether purge requests reach a CDN
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Purger used when no CDN credentials are configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPurger;

#[async_trait]
impl CachePurger for NoopPurger {
    async fn purge(&self, url: &str) {
        tracing::debug!("Purge disabled, skipping {}", url);
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Builds the purger described by the config
///
/// Without both a zone id and an API token purging is disabled.
pub fn build_purger(config: &Config) -> Arc<dyn CachePurger> {
    let credentials = config.purge.as_ref().and_then(|purge| {
        purge
            .credentials()
            .map(|(zone, token)| (purge.api_base.as_str(), zone, token))
    });

    match credentials {
        Some((api_base, zone, token)) => match CloudflarePurger::new(api_base, zone, token) {
            Ok(purger) => Arc::new(purger),
            Err(e) => {
                tracing::warn!("Purge disabled: {}", e);
                Arc::new(NoopPurger)
            }
        },
        None => {
            tracing::info!("Purge disabled (no zone id or API token)");
            Arc::new(NoopPurger)
        }
    }
}
