//! Run identity: id, start time and the human-readable run label

use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};

/// Identifies one invocation of the warmer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    /// Random id, unique per invocation
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Label naming the run's export destination, e.g. `2025-08-21_14-00-00_WITA`
    pub sheet_name: String,
}

impl RunIdentity {
    /// Starts a new run now
    pub fn new(utc_offset_hours: i32, label: &str) -> Self {
        Self::starting_at(Utc::now(), utc_offset_hours, label)
    }

    pub fn starting_at(started_at: DateTime<Utc>, utc_offset_hours: i32, label: &str) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().simple().to_string(),
            started_at,
            sheet_name: sheet_name_for(started_at, utc_offset_hours, label),
        }
    }
}

/// Renders `at` in the given fixed offset as `YYYY-MM-DD_HH-MM-SS_<label>`
pub fn sheet_name_for(at: DateTime<Utc>, utc_offset_hours: i32, label: &str) -> String {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
    format!(
        "{}_{}",
        at.with_timezone(&offset).format("%Y-%m-%d_%H-%M-%S"),
        label
    )
}

/// RFC 3339 UTC with milliseconds, e.g. `2025-08-21T06:00:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
