//! Cache status values reported by CDN and origin cache headers
//!
//! Both `cf-cache-status` and `x-vercel-cache` speak a small uppercase
//! vocabulary. Parsing is case-insensitive; anything outside the
//! vocabulary is kept verbatim as [`CacheStatus::Unknown`].

use reqwest::header::HeaderMap;
use std::fmt;

/// Response header carrying the CDN (edge) cache status
pub const CDN_CACHE_HEADER: &str = "cf-cache-status";

/// Response header carrying the origin cache status
pub const ORIGIN_CACHE_HEADER: &str = "x-vercel-cache";

/// Response header carrying the CDN ray identifier
pub const RAY_HEADER: &str = "cf-ray";

/// A parsed cache status header value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    Hit,
    Miss,
    Expired,
    Stale,
    Updating,
    Revalidated,
    Prerender,
    Bypass,
    Dynamic,
    /// Any value outside the known vocabulary, kept as received
    Unknown(String),
}

impl CacheStatus {
    /// Parses a raw header value
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "HIT" => Self::Hit,
            "MISS" => Self::Miss,
            "EXPIRED" => Self::Expired,
            "STALE" => Self::Stale,
            "UPDATING" => Self::Updating,
            "REVALIDATED" => Self::Revalidated,
            "PRERENDER" | "PRERENDERED" => Self::Prerender,
            "BYPASS" => Self::Bypass,
            "DYNAMIC" => Self::Dynamic,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }

    /// Reads and parses a header, `None` when absent or not valid text
    pub fn from_headers(headers: &HeaderMap, name: &str) -> Option<Self> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(Self::parse)
    }

    /// True when an origin reporting this status left the edge cold or stale
    pub fn needs_purge(&self) -> bool {
        matches!(
            self,
            Self::Miss | Self::Revalidated | Self::Prerender | Self::Stale
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Expired => "EXPIRED",
            Self::Stale => "STALE",
            Self::Updating => "UPDATING",
            Self::Revalidated => "REVALIDATED",
            Self::Prerender => "PRERENDER",
            Self::Bypass => "BYPASS",
            Self::Dynamic => "DYNAMIC",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
