//! Webhook export of run rows
//!
//! The whole run is delivered in one JSON POST of the form
//! `{"sheetName": "...", "rows": [[...12 columns...], ...]}`. The receiver
//! answers `{"ok": true, "inserted": N, "sheet": "..."}`.

use crate::config::Config;
use crate::WarmError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while exporting a batch
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Webhook request failed: {0}")]
    Http(String),

    #[error("Webhook answered with status code {0}")]
    Status(u16),

    #[error("Webhook rejected the rows: {0}")]
    Rejected(String),

    #[error("Webhook reply could not be read: {0}")]
    InvalidReply(String),
}

/// Payload of one export request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBatch {
    pub sheet_name: String,
    pub rows: Vec<[Value; super::run_log::ROW_COLUMNS]>,
}

/// Reply of the export destination
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportReceipt {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub inserted: Option<u64>,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Destination that accepts a run's rows
#[async_trait]
pub trait RowExporter: Send + Sync {
    async fn export(&self, batch: &ExportBatch) -> Result<ExportReceipt, ExportError>;
}

/// Posts batches to an HTTP webhook
#[derive(Debug, Clone)]
pub struct WebhookExporter {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookExporter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ExportError::Http(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    /// Builds the exporter named by the config, if any
    ///
    /// Returns `Ok(None)` when no webhook URL is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, WarmError> {
        let Some(export) = config.export.as_ref() else {
            return Ok(None);
        };
        let Some(url) = export.webhook() else {
            return Ok(None);
        };
        Ok(Some(Self::new(
            url,
            Duration::from_secs(export.timeout_secs),
        )?))
    }
}

#[async_trait]
impl RowExporter for WebhookExporter {
    async fn export(&self, batch: &ExportBatch) -> Result<ExportReceipt, ExportError> {
        tracing::debug!(
            "Exporting {} rows to sheet {}",
            batch.rows.len(),
            batch.sheet_name
        );

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(batch)
            .send()
            .await
            .map_err(|e| ExportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExportError::Http(e.to_string()))?;
        tracing::debug!("Webhook response: {} {}", status.as_u16(), body);

        let receipt: ExportReceipt =
            serde_json::from_str(&body).map_err(|e| ExportError::InvalidReply(e.to_string()))?;

        if !receipt.ok {
            return Err(ExportError::Rejected(
                receipt
                    .error
                    .clone()
                    .unwrap_or_else(|| "reply did not report ok".to_string()),
            ));
        }

        Ok(receipt)
    }
}
