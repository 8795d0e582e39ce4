//! Run-scoped outcome buffer
//!
//! Rows are appended during the run and exported in one request at the
//! end. The completion time is not known while rows are created, so it is
//! stamped onto every buffered row at once by [`RunLog::set_finished`].
//! Rows are only dropped after an export the destination acknowledged.

use crate::output::run::{format_timestamp, RunIdentity};
use crate::output::webhook::{ExportBatch, ExportError, ExportReceipt, RowExporter};
use crate::warmer::WarmResult;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Number of columns in an exported row
pub const ROW_COLUMNS: usize = 12;

/// Fields of one logged row; anything left out defaults to empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFields {
    /// Edge tag or site code
    pub tag: String,
    pub url: String,
    pub status: Option<u16>,
    pub cdn_cache: String,
    pub origin_cache: String,
    pub ray: String,
    pub latency_ms: Option<u64>,
    pub error: bool,
    pub message: String,
}

impl LogFields {
    /// A row carrying only a tag and a message
    pub fn note(tag: &str, message: impl Into<String>) -> Self {
        Self {
            tag: tag.to_string(),
            message: message.into(),
            ..Self::default()
        }
    }
}

impl From<&WarmResult> for LogFields {
    fn from(result: &WarmResult) -> Self {
        if result.is_error {
            return Self {
                tag: result.tag.clone(),
                url: result.url.clone(),
                status: result.http_status,
                latency_ms: result.latency_ms,
                error: true,
                message: result
                    .message
                    .clone()
                    .unwrap_or_else(|| "request failed".to_string()),
                ..Self::default()
            };
        }

        Self {
            tag: result.tag.clone(),
            url: result.url.clone(),
            status: result.http_status,
            cdn_cache: result
                .cdn_cache_status
                .as_ref()
                .map_or_else(|| "N/A".to_string(), |s| s.to_string()),
            origin_cache: result
                .origin_cache_status
                .as_ref()
                .map_or_else(|| "N/A".to_string(), |s| s.to_string()),
            ray: result
                .cdn_ray_id
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            latency_ms: result.latency_ms,
            error: false,
            message: result.message.clone().unwrap_or_default(),
        }
    }
}

/// Anything outcome rows can be appended to
pub trait RecordSink {
    fn log(&mut self, fields: LogFields);
}

impl RecordSink for Vec<LogFields> {
    fn log(&mut self, fields: LogFields) {
        self.push(fields);
    }
}

/// One buffered row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub run_id: String,
    pub started_at: String,
    /// Empty until the run is finished
    pub finished_at: Option<String>,
    pub fields: LogFields,
}

impl LogRow {
    /// Renders the row in export column order:
    /// run id, started, finished, tag, url, status, cdn cache, origin cache,
    /// ray, latency, error flag, message
    pub fn to_columns(&self) -> [Value; ROW_COLUMNS] {
        let f = &self.fields;
        [
            Value::from(self.run_id.clone()),
            Value::from(self.started_at.clone()),
            self.finished_at.clone().map_or(Value::Null, Value::from),
            Value::from(f.tag.clone()),
            Value::from(f.url.clone()),
            f.status.map_or_else(|| Value::from(""), Value::from),
            Value::from(f.cdn_cache.clone()),
            Value::from(f.origin_cache.clone()),
            Value::from(f.ray.clone()),
            f.latency_ms.map_or_else(|| Value::from(""), Value::from),
            Value::from(u8::from(f.error)),
            Value::from(f.message.clone()),
        ]
    }
}

/// What a flush did
#[derive(Debug)]
pub enum FlushOutcome {
    /// No export destination configured
    Disabled,
    /// Nothing was buffered
    Empty,
    /// Rows were accepted and the buffer cleared
    Exported {
        rows: usize,
        receipt: ExportReceipt,
    },
    /// Export failed; rows are still buffered
    Failed { retained: usize, error: ExportError },
}

/// Append-only buffer of a run's outcomes
#[derive(Debug)]
pub struct RunLog {
    identity: RunIdentity,
    finished_at: Option<DateTime<Utc>>,
    rows: Vec<LogRow>,
}

impl RunLog {
    pub fn new(identity: RunIdentity) -> Self {
        Self {
            identity,
            finished_at: None,
            rows: Vec::new(),
        }
    }

    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn rows(&self) -> &[LogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row
    pub fn log(&mut self, fields: LogFields) {
        self.rows.push(LogRow {
            run_id: self.identity.run_id.clone(),
            started_at: format_timestamp(self.identity.started_at),
            finished_at: self.finished_at.map(format_timestamp),
            fields,
        });
    }

    /// Marks the run finished now and stamps every buffered row
    pub fn set_finished(&mut self) {
        self.set_finished_at(Utc::now());
    }

    /// Marks the run finished at `at` and stamps every buffered row
    pub fn set_finished_at(&mut self, at: DateTime<Utc>) {
        self.finished_at = Some(at);
        let stamp = format_timestamp(at);
        for row in &mut self.rows {
            row.finished_at = Some(stamp.clone());
        }
    }

    /// The buffered rows as an export payload
    pub fn batch(&self) -> ExportBatch {
        ExportBatch {
            sheet_name: self.identity.sheet_name.clone(),
            rows: self.rows.iter().map(LogRow::to_columns).collect(),
        }
    }

    /// Exports the whole buffer in one request
    ///
    /// Does nothing without an exporter or without rows. The buffer is only
    /// cleared after the destination acknowledged the rows.
    pub async fn flush(&mut self, exporter: Option<&dyn RowExporter>) -> FlushOutcome {
        let Some(exporter) = exporter else {
            tracing::warn!(
                "Export disabled (no webhook configured), {} rows not exported",
                self.rows.len()
            );
            return FlushOutcome::Disabled;
        };

        if self.rows.is_empty() {
            return FlushOutcome::Empty;
        }

        match exporter.export(&self.batch()).await {
            Ok(receipt) => {
                let rows = self.rows.len();
                tracing::info!(
                    "Logged {} rows to sheet: {}",
                    receipt.inserted.unwrap_or(rows as u64),
                    receipt.sheet.as_deref().unwrap_or(&self.identity.sheet_name)
                );
                self.rows.clear();
                FlushOutcome::Exported { rows, receipt }
            }
            Err(error) => {
                tracing::warn!(
                    "Export failed, keeping {} buffered rows: {}",
                    self.rows.len(),
                    error
                );
                FlushOutcome::Failed {
                    retained: self.rows.len(),
                    error,
                }
            }
        }
    }
}

impl RecordSink for RunLog {
    fn log(&mut self, fields: LogFields) {
        RunLog::log(self, fields);
    }
}
