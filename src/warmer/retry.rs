//! Bounded retry around a single fetch
//!
//! Only transient network failures (connection aborted, connection reset,
//! timed out) are retried, with a fixed pause between attempts. Everything
//! else, including HTTP error statuses, is returned after the first attempt.

use crate::config::WarmerConfig;
use crate::warmer::fetcher::{FetchedPage, PageFetcher};
use crate::FetchResult;
use std::time::Duration;

/// Attempt budget and spacing for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &WarmerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Fetches `url`, retrying transient failures
    pub async fn get(
        &self,
        fetcher: &dyn PageFetcher,
        url: &str,
        timeout: Duration,
    ) -> FetchResult<FetchedPage> {
        retryable_get(fetcher, url, timeout, self).await
    }
}

/// Fetches `url` with up to `policy.max_attempts` attempts
///
/// Returns the last error once the budget is spent. No pause follows the
/// final attempt.
pub async fn retryable_get(
    fetcher: &dyn PageFetcher,
    url: &str,
    timeout: Duration,
    policy: &RetryPolicy,
) -> FetchResult<FetchedPage> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match fetcher.fetch(url, timeout).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::debug!(
                    "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                    attempt,
                    attempts,
                    url,
                    e,
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
