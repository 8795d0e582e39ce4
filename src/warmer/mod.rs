//! Warmer module for sitemap discovery and cache warming
//!
//! This module contains the core warming pipeline:
//! - Proxied HTTP fetching with error classification
//! - Retry of transient network failures
//! - Sitemap index and urlset resolution
//! - Windowed warming with purge of cold origin responses
//! - Run orchestration over all configured sites

mod coordinator;
mod engine;
mod fetcher;
mod retry;
mod sitemap;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{Coordinator, RunReport};
pub use engine::{edge_tag, WarmResult, WarmSettings, WarmTally, WarmingEngine};
pub use fetcher::{
    build_site_client, classify_error, transient_kind, FetchedPage, PageFetcher, ProxiedClient,
    ProxyConnector, SiteConnector,
};
pub use retry::{retryable_get, RetryPolicy};
pub use sitemap::{parse_sitemap_index, parse_urlset, SitemapResolver};
