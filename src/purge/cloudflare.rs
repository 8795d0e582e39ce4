//! Cloudflare purge-by-URL client

use super::{CachePurger, PurgeError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const PURGE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct PurgeReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Purges single files from a Cloudflare zone
#[derive(Debug, Clone)]
pub struct CloudflarePurger {
    client: Client,
    endpoint: String,
    api_token: String,
}

impl CloudflarePurger {
    pub fn new(api_base: &str, zone_id: &str, api_token: &str) -> Result<Self, PurgeError> {
        let client = Client::builder()
            .timeout(PURGE_TIMEOUT)
            .build()
            .map_err(|e| PurgeError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/zones/{}/purge_cache",
                api_base.trim_end_matches('/'),
                zone_id
            ),
            api_token: api_token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Requests a purge of `url` and reports the API's verdict
    pub async fn try_purge(&self, url: &str) -> Result<(), PurgeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&json!({ "files": [url] }))
            .send()
            .await
            .map_err(|e| PurgeError::Http(e.to_string()))?;

        let status = response.status();
        let reply: Option<PurgeReply> = response.json().await.ok();

        match reply {
            Some(reply) if reply.success => Ok(()),
            Some(reply) if !reply.errors.is_empty() => Err(PurgeError::Rejected(
                serde_json::Value::from(reply.errors).to_string(),
            )),
            _ if !status.is_success() => Err(PurgeError::Status(status.as_u16())),
            _ => Err(PurgeError::Rejected("success=false".to_string())),
        }
    }
}

#[async_trait]
impl CachePurger for CloudflarePurger {
    async fn purge(&self, url: &str) {
        match self.try_purge(url).await {
            Ok(()) => tracing::info!("Cache purged for: {}", url),
            Err(e) => tracing::warn!("Purge failed for {}: {}", url, e),
        }
    }
}
