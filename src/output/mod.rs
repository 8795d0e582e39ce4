//! Output module for run records and reports
//!
//! This module handles:
//! - Naming the run and stamping its timestamps
//! - Buffering one row per outcome for the whole run
//! - Exporting the buffer to a webhook in a single request
//! - Summarizing run statistics

pub mod run;
pub mod run_log;
pub mod stats;
pub mod webhook;

pub use run::{format_timestamp, sheet_name_for, RunIdentity};
pub use run_log::{FlushOutcome, LogFields, LogRow, RecordSink, RunLog, ROW_COLUMNS};
pub use stats::{print_statistics, RunStatistics};
pub use webhook::{ExportBatch, ExportError, ExportReceipt, RowExporter, WebhookExporter};
