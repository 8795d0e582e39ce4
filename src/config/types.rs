use serde::Deserialize;

/// Main configuration structure for Edge-Warmer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub warmer: WarmerConfig,
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub purge: Option<PurgeConfig>,
    #[serde(default)]
    pub export: Option<ExportConfig>,
}

impl Config {
    /// Looks up a site by its code
    pub fn site(&self, code: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.code == code)
    }

    /// Offset and label used to name the run
    pub fn run_label(&self) -> (i32, String) {
        let export = self.export.clone().unwrap_or_default();
        (export.sheet_utc_offset_hours, export.sheet_label)
    }
}

/// Warming behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WarmerConfig {
    /// Number of URLs requested concurrently within one window
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive windows (milliseconds)
    #[serde(rename = "batch-delay-ms", default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Total attempts per URL, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(rename = "sitemap-timeout-secs", default = "default_sitemap_timeout")]
    pub sitemap_timeout_secs: u64,

    #[serde(rename = "warm-timeout-secs", default = "default_warm_timeout")]
    pub warm_timeout_secs: u64,

    /// Whether sites are processed one after another or all at once
    #[serde(rename = "site-mode", default)]
    pub site_mode: SiteMode,
}

impl Default for WarmerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            sitemap_timeout_secs: default_sitemap_timeout(),
            warm_timeout_secs: default_warm_timeout(),
            site_mode: SiteMode::default(),
        }
    }
}

/// How the coordinator schedules sites relative to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    #[default]
    Sequential,
    Concurrent,
}

impl std::str::FromStr for SiteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(format!(
                "unknown site mode '{}', expected 'sequential' or 'concurrent'",
                other
            )),
        }
    }
}

/// One warmed site: where it lives and how to reach it
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Short site code, used as the fallback edge tag (e.g. "se")
    pub code: String,

    /// Site origin, without trailing sitemap path
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Outbound proxy URL every request for this site goes through
    #[serde(default)]
    pub proxy: Option<String>,

    /// Environment variable holding the proxy URL
    #[serde(rename = "proxy-env", default)]
    pub proxy_env: Option<String>,

    /// Identifying User-Agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl SiteConfig {
    /// URL of the site's root sitemap
    pub fn sitemap_url(&self) -> String {
        format!("{}/sitemap.xml", self.base_url.trim_end_matches('/'))
    }

    /// Resolved proxy endpoint; empty only before validation
    pub fn proxy_endpoint(&self) -> &str {
        self.proxy.as_deref().unwrap_or("")
    }
}

/// CDN purge credentials
#[derive(Debug, Clone, Deserialize)]
pub struct PurgeConfig {
    #[serde(rename = "zone-id", default)]
    pub zone_id: Option<String>,

    #[serde(rename = "api-token", default)]
    pub api_token: Option<String>,

    #[serde(rename = "api-base", default = "default_purge_api_base")]
    pub api_base: String,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            zone_id: None,
            api_token: None,
            api_base: default_purge_api_base(),
        }
    }
}

impl PurgeConfig {
    /// Returns zone and token when both are present and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let zone = self.zone_id.as_deref().filter(|z| !z.is_empty())?;
        let token = self.api_token.as_deref().filter(|t| !t.is_empty())?;
        Some((zone, token))
    }
}

/// Export webhook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(rename = "webhook-url", default)]
    pub webhook_url: Option<String>,

    #[serde(rename = "timeout-secs", default = "default_export_timeout")]
    pub timeout_secs: u64,

    /// Offset used when rendering the run label
    #[serde(rename = "sheet-utc-offset-hours", default = "default_sheet_offset")]
    pub sheet_utc_offset_hours: i32,

    /// Suffix naming the offset in the run label
    #[serde(rename = "sheet-label", default = "default_sheet_label")]
    pub sheet_label: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_export_timeout(),
            sheet_utc_offset_hours: default_sheet_offset(),
            sheet_label: default_sheet_label(),
        }
    }
}

impl ExportConfig {
    pub fn webhook(&self) -> Option<&str> {
        self.webhook_url.as_deref().filter(|u| !u.is_empty())
    }
}

fn default_batch_size() -> usize {
    3
}

fn default_batch_delay_ms() -> u64 {
    7000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_sitemap_timeout() -> u64 {
    15
}

fn default_warm_timeout() -> u64 {
    30
}

fn default_purge_api_base() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_export_timeout() -> u64 {
    20
}

fn default_sheet_offset() -> i32 {
    8
}

fn default_sheet_label() -> String {
    "WITA".to_string()
}
