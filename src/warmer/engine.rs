//! Warming engine
//!
//! URLs are split into fixed-size windows. Requests inside a window run
//! concurrently; windows run strictly one after another with a fixed pause
//! between consecutive windows (not before the first, not after the last).
//!
//! Each URL moves `Pending -> InFlight -> WarmedOk | WarmedError`. Successful
//! responses are classified from their cache headers, and an origin cache
//! status that shows the edge was cold or stale triggers a purge of that
//! exact URL. Every outcome is recorded; nothing escapes as an error.

use crate::config::{SiteConfig, WarmerConfig};
use crate::output::{LogFields, RecordSink};
use crate::purge::CachePurger;
use crate::state::{CacheStatus, WarmState, CDN_CACHE_HEADER, ORIGIN_CACHE_HEADER, RAY_HEADER};
use crate::warmer::fetcher::PageFetcher;
use crate::warmer::retry::RetryPolicy;
use futures::future::join_all;
use std::time::Duration;
use tokio::time::Instant;

/// Pacing settings for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmSettings {
    /// URLs per window
    pub batch_size: usize,
    /// Pause between consecutive windows
    pub batch_delay: Duration,
    /// Per-request timeout for warm requests
    pub warm_timeout: Duration,
}

impl Default for WarmSettings {
    fn default() -> Self {
        Self::from_config(&WarmerConfig::default())
    }
}

impl WarmSettings {
    pub fn from_config(config: &WarmerConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            warm_timeout: Duration::from_secs(config.warm_timeout_secs),
        }
    }

    /// Number of windows needed for `url_count` URLs
    pub fn window_count(&self, url_count: usize) -> usize {
        url_count.div_ceil(self.batch_size.max(1))
    }
}

/// Outcome of warming one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmResult {
    /// Edge location that served the request, or the site code
    pub tag: String,
    pub url: String,
    pub http_status: Option<u16>,
    pub cdn_cache_status: Option<CacheStatus>,
    pub origin_cache_status: Option<CacheStatus>,
    pub cdn_ray_id: Option<String>,
    pub latency_ms: Option<u64>,
    pub is_error: bool,
    pub message: Option<String>,
    /// Whether a purge was requested for this URL
    pub purge_requested: bool,
}

impl WarmResult {
    pub fn state(&self) -> WarmState {
        if self.is_error {
            WarmState::WarmedError
        } else {
            WarmState::WarmedOk
        }
    }
}

/// Per-call counters returned by [`WarmingEngine::warm_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmTally {
    pub windows: usize,
    pub warmed_ok: usize,
    pub warmed_error: usize,
    pub purges_requested: usize,
}

impl WarmTally {
    pub fn merge(&mut self, other: WarmTally) {
        self.windows += other.windows;
        self.warmed_ok += other.warmed_ok;
        self.warmed_error += other.warmed_error;
        self.purges_requested += other.purges_requested;
    }
}

/// Edge tag from a ray id such as `8a1b2c3d4e5f6789-ARN`
///
/// The trailing segment names the serving location. Without a usable
/// segment the site code is used instead.
pub fn edge_tag(ray: Option<&str>, fallback: &str) -> String {
    ray.and_then(|r| r.trim().rsplit_once('-'))
        .map(|(_, location)| location.trim())
        .filter(|location| !location.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

/// Issues warm requests with bounded concurrency and records every outcome
pub struct WarmingEngine<'a> {
    settings: WarmSettings,
    retry: RetryPolicy,
    purger: &'a dyn CachePurger,
}

impl<'a> WarmingEngine<'a> {
    pub fn new(settings: WarmSettings, retry: RetryPolicy, purger: &'a dyn CachePurger) -> Self {
        Self {
            settings,
            retry,
            purger,
        }
    }

    /// Warms `urls` for `site`, appending one record per URL to `sink`
    ///
    /// Records of a window are appended in URL order once the whole window
    /// has finished, before the next window starts.
    pub async fn warm_all(
        &self,
        fetcher: &dyn PageFetcher,
        urls: &[String],
        site: &SiteConfig,
        sink: &mut dyn RecordSink,
    ) -> WarmTally {
        let mut tally = WarmTally::default();
        let windows = urls.chunks(self.settings.batch_size.max(1));

        for (index, window) in windows.enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.batch_delay).await;
            }

            tracing::debug!(
                "[{}] Window {}/{} ({} URLs)",
                site.code,
                index + 1,
                self.settings.window_count(urls.len()),
                window.len()
            );

            let results = join_all(window.iter().map(|url| self.warm_one(fetcher, url, site))).await;

            for result in results {
                if result.is_error {
                    tally.warmed_error += 1;
                } else {
                    tally.warmed_ok += 1;
                }
                if result.purge_requested {
                    tally.purges_requested += 1;
                }
                sink.log(LogFields::from(&result));
            }
            tally.windows += 1;
        }

        tally
    }

    /// Warms a single URL; never fails
    pub async fn warm_one(
        &self,
        fetcher: &dyn PageFetcher,
        url: &str,
        site: &SiteConfig,
    ) -> WarmResult {
        let mut state = WarmState::Pending;
        advance(&mut state, WarmState::InFlight, url);
        let started = Instant::now();

        match self.retry.get(fetcher, url, self.settings.warm_timeout).await {
            Ok(page) => {
                let latency_ms = elapsed_ms(started);
                let cdn = CacheStatus::from_headers(&page.headers, CDN_CACHE_HEADER);
                let origin = CacheStatus::from_headers(&page.headers, ORIGIN_CACHE_HEADER);
                let ray = page
                    .headers
                    .get(RAY_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                let tag = edge_tag(ray.as_deref(), &site.code);

                tracing::info!(
                    "[{}] [{}] cf={} vercel={} - {}",
                    tag,
                    page.status,
                    display_or_na(cdn.as_ref()),
                    display_or_na(origin.as_ref()),
                    url
                );
                tracing::debug!("[{}] Edge: {}", tag, ray.as_deref().unwrap_or("unknown"));

                let purge_requested = origin.as_ref().is_some_and(CacheStatus::needs_purge);
                if purge_requested {
                    self.purger.purge(url).await;
                }

                advance(&mut state, WarmState::WarmedOk, url);
                WarmResult {
                    tag,
                    url: url.to_string(),
                    http_status: Some(page.status),
                    cdn_cache_status: cdn,
                    origin_cache_status: origin,
                    cdn_ray_id: ray,
                    latency_ms: Some(latency_ms),
                    is_error: false,
                    message: None,
                    purge_requested,
                }
            }
            Err(e) => {
                let latency_ms = elapsed_ms(started);
                tracing::warn!("[{}] Failed to warm {}: {}", site.code, url, e);

                advance(&mut state, WarmState::WarmedError, url);
                WarmResult {
                    tag: site.code.clone(),
                    url: url.to_string(),
                    http_status: e.status(),
                    cdn_cache_status: None,
                    origin_cache_status: None,
                    cdn_ray_id: None,
                    latency_ms: Some(latency_ms),
                    is_error: true,
                    message: Some(e.to_string()),
                    purge_requested: false,
                }
            }
        }
    }
}

fn advance(state: &mut WarmState, next: WarmState, url: &str) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid warm transition {} -> {}",
        state,
        next
    );
    tracing::trace!("{}: {} -> {}", url, state, next);
    *state = next;
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn display_or_na(status: Option<&CacheStatus>) -> &str {
    status.map(CacheStatus::as_str).unwrap_or("N/A")
}
