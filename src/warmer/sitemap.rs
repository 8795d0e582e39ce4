//! Sitemap discovery
//!
//! A site's `/sitemap.xml` is expected to be a sitemap index whose
//! `<sitemap><loc>` entries point at page sitemaps; each page sitemap is a
//! `<urlset>` whose `<url><loc>` entries are the pages to warm. Resolution
//! goes exactly one level deep.
//!
//! Parsing ignores attributes and unknown elements. Entries are always
//! collected into a sequence, so a document with a single child yields a
//! one-element list.
//!
//! Failures never escape this module: a sitemap that cannot be fetched or
//! parsed contributes no URLs and is reported as a warning.

use crate::config::SiteConfig;
use crate::warmer::fetcher::PageFetcher;
use crate::WarmError;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

/// A `<sitemap>` or `<url>` entry; only `<loc>` matters
#[derive(Debug, Deserialize)]
struct LocEntry {
    #[serde(default)]
    loc: String,
}

#[derive(Debug, Deserialize)]
struct SitemapIndexDocument {
    #[serde(rename = "sitemap", default)]
    sitemaps: Vec<LocEntry>,
}

#[derive(Debug, Deserialize)]
struct UrlSetDocument {
    #[serde(rename = "url", default)]
    urls: Vec<LocEntry>,
}

/// Extracts sub-sitemap URLs from a sitemap index document
///
/// A document without `<sitemap>` children (including a `<urlset>`) yields
/// an empty list.
///
/// # Example
///
/// ```
/// use edge_warmer::warmer::parse_sitemap_index;
///
/// let xml = r#"<sitemapindex><sitemap><loc>https://example.com/pages.xml</loc></sitemap></sitemapindex>"#;
/// let sitemaps = parse_sitemap_index(xml, "https://example.com/sitemap.xml").unwrap();
/// assert_eq!(sitemaps, vec!["https://example.com/pages.xml".to_string()]);
/// ```
pub fn parse_sitemap_index(xml: &str, source_url: &str) -> Result<Vec<String>, WarmError> {
    let document: SitemapIndexDocument =
        quick_xml::de::from_str(xml).map_err(|e| WarmError::SitemapParse {
            url: source_url.to_string(),
            message: e.to_string(),
        })?;
    Ok(collect_locs(document.sitemaps))
}

/// Extracts page URLs from a `<urlset>` document
pub fn parse_urlset(xml: &str, source_url: &str) -> Result<Vec<String>, WarmError> {
    let document: UrlSetDocument =
        quick_xml::de::from_str(xml).map_err(|e| WarmError::SitemapParse {
            url: source_url.to_string(),
            message: e.to_string(),
        })?;
    Ok(collect_locs(document.urls))
}

fn collect_locs(entries: Vec<LocEntry>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| entry.loc.trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// Resolves a site's sitemaps through the site's fetcher
pub struct SitemapResolver<'a> {
    fetcher: &'a dyn PageFetcher,
    site: &'a SiteConfig,
    timeout: Duration,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, site: &'a SiteConfig, timeout: Duration) -> Self {
        Self {
            fetcher,
            site,
            timeout,
        }
    }

    /// Lists the sub-sitemaps named by `{base-url}/sitemap.xml`
    pub async fn resolve_sitemap_index(&self) -> Vec<String> {
        let index_url = self.site.sitemap_url();
        match self.fetch_and_parse(&index_url, parse_sitemap_index).await {
            Ok(sitemaps) => {
                tracing::debug!(
                    "[{}] Sitemap index lists {} sitemaps",
                    self.site.code,
                    sitemaps.len()
                );
                sitemaps
            }
            Err(e) => {
                tracing::warn!("[{}] Failed to fetch sitemap index: {}", self.site.code, e);
                Vec::new()
            }
        }
    }

    /// Lists the page URLs of one page sitemap
    pub async fn resolve_urls(&self, sitemap_url: &str) -> Vec<String> {
        match self.fetch_and_parse(sitemap_url, parse_urlset).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!(
                    "[{}] Failed to fetch URLs from {}: {}",
                    self.site.code,
                    sitemap_url,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Resolves the index, then all page sitemaps concurrently
    ///
    /// URLs keep sitemap order: all URLs of the first sub-sitemap, then the
    /// second, and so on. A URL listed more than once is kept only where it
    /// first appears.
    pub async fn resolve_all(&self) -> Vec<String> {
        let sitemaps = self.resolve_sitemap_index().await;
        let url_lists = join_all(sitemaps.iter().map(|s| self.resolve_urls(s))).await;

        let mut seen = HashSet::new();
        url_lists
            .into_iter()
            .flatten()
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    async fn fetch_and_parse(
        &self,
        url: &str,
        parse: fn(&str, &str) -> Result<Vec<String>, WarmError>,
    ) -> Result<Vec<String>, WarmError> {
        let page = self.fetcher.fetch(url, self.timeout).await?;
        parse(&page.body, url)
    }
}
