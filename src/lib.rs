//! Edge-Warmer: a sitemap-driven CDN cache warmer
//!
//! This crate discovers every public URL of a set of sites through their
//! sitemaps, requests each URL through a per-site proxy to populate edge
//! caches, and asks the CDN to purge any URL the origin served cold.

pub mod config;
pub mod output;
pub mod purge;
pub mod state;
pub mod warmer;

use thiserror::Error;

/// Main error type for Edge-Warmer operations
#[derive(Debug, Error)]
pub enum WarmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to build HTTP client for site {site}: {source}")]
    ClientBuild {
        site: String,
        source: reqwest::Error,
    },

    #[error("Sitemap parse error for {url}: {message}")]
    SitemapParse { url: String, message: String },

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// Network error kinds that are worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    ConnectionAborted,
    ConnectionReset,
    TimedOut,
}

impl TransientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionAborted => "connection aborted",
            Self::ConnectionReset => "connection reset",
            Self::TimedOut => "timed out",
        }
    }
}

impl std::fmt::Display for TransientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by a single proxied request
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request to {url} {kind}")]
    Transient { url: String, kind: TransientKind },

    #[error("Request to {url} failed with status code {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// Only transient network failures are retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for Edge-Warmer operations
pub type Result<T> = std::result::Result<T, WarmError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::{Config, SiteConfig};
pub use state::{CacheStatus, WarmState};
pub use warmer::{Coordinator, RunReport};
