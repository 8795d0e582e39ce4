//! Proxied HTTP fetcher
//!
//! Every request for a site goes through that site's outbound proxy with the
//! site's identifying User-Agent. There is no direct-connection fallback: an
//! unreachable proxy is a failed request.
//!
//! Errors are classified into the crate's [`FetchError`] kinds here, so the
//! retry policy only has to ask [`FetchError::is_retryable`].

use crate::config::SiteConfig;
use crate::{FetchError, FetchResult, TransientKind, WarmError};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Proxy};
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// A successful response, fully read
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code (always 2xx)
    pub status: u16,
    /// Response headers; lookups are case-insensitive
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
}

/// Something that can GET a URL on behalf of one site
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url`, failing if no complete response arrives within `timeout`
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedPage>;
}

/// Produces the fetcher used for a site
pub trait SiteConnector: Send + Sync {
    fn connect(&self, site: &SiteConfig) -> Result<Arc<dyn PageFetcher>, WarmError>;
}

/// Connector building a [`ProxiedClient`] per site
#[derive(Debug, Default, Clone, Copy)]
pub struct ProxyConnector;

impl SiteConnector for ProxyConnector {
    fn connect(&self, site: &SiteConfig) -> Result<Arc<dyn PageFetcher>, WarmError> {
        Ok(Arc::new(ProxiedClient::new(site)?))
    }
}

/// reqwest client bound to one site's proxy and User-Agent
#[derive(Debug, Clone)]
pub struct ProxiedClient {
    client: Client,
}

impl ProxiedClient {
    pub fn new(site: &SiteConfig) -> Result<Self, WarmError> {
        let client = build_site_client(site).map_err(|source| WarmError::ClientBuild {
            site: site.code.clone(),
            source,
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for ProxiedClient {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedPage> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| classify_error(url, &e))?;

        Ok(FetchedPage {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// Builds an HTTP client that routes everything through the site's proxy
///
/// # Example
///
/// ```no_run
/// use edge_warmer::config::SiteConfig;
/// use edge_warmer::warmer::build_site_client;
///
/// let site = SiteConfig {
///     code: "se".to_string(),
///     base_url: "https://www.example.se".to_string(),
///     proxy: Some("http://proxy.example.net:22225".to_string()),
///     proxy_env: None,
///     user_agent: "Example-SE-CacheWarmer/1.0".to_string(),
/// };
///
/// let client = build_site_client(&site).unwrap();
/// ```
pub fn build_site_client(site: &SiteConfig) -> Result<Client, reqwest::Error> {
    let proxy = Proxy::all(site.proxy_endpoint())?;

    Client::builder()
        .user_agent(site.user_agent.as_str())
        .proxy(proxy)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a reqwest failure onto the crate's fetch error kinds
///
/// | Condition | Kind |
/// |-----------|------|
/// | Request timeout | Transient (timed out) |
/// | IO reset / aborted / timed out | Transient |
/// | DNS, refused, proxy auth, TLS, body | Request (permanent) |
pub fn classify_error(url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Transient {
            url: url.to_string(),
            kind: TransientKind::TimedOut,
        };
    }

    if let Some(kind) = io_error_kind(err).and_then(transient_kind) {
        return FetchError::Transient {
            url: url.to_string(),
            kind,
        };
    }

    FetchError::Request {
        url: url.to_string(),
        message: error_chain(err),
    }
}

/// Transient kind for an IO error kind, if it is on the retry whitelist
pub fn transient_kind(kind: io::ErrorKind) -> Option<TransientKind> {
    match kind {
        io::ErrorKind::ConnectionAborted => Some(TransientKind::ConnectionAborted),
        io::ErrorKind::ConnectionReset => Some(TransientKind::ConnectionReset),
        io::ErrorKind::TimedOut => Some(TransientKind::TimedOut),
        _ => None,
    }
}

/// Finds the innermost IO error in the source chain
fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    let mut found = None;
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            found = Some(io_err.kind());
        }
        current = e.source();
    }
    found
}

/// Joins an error and its sources into one line
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        let next = e.to_string();
        if !message.contains(&next) {
            message.push_str(": ");
            message.push_str(&next);
        }
        current = e.source();
    }
    message
}
