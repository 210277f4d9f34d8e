//! Cron monitor check-in records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a monitored job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    InProgress,
    Ok,
    Error,
}

/// A single check-in reported for a cron monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    /// Unique check-in id; generated when the check-in is captured
    pub check_in_id: Uuid,

    /// Slug of the monitor this check-in belongs to
    pub monitor_slug: String,

    pub status: CheckInStatus,

    /// Job duration in seconds, for completed runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl CheckIn {
    pub fn new(monitor_slug: impl Into<String>, status: CheckInStatus) -> Self {
        Self {
            check_in_id: Uuid::new_v4(),
            monitor_slug: monitor_slug.into(),
            status,
            duration_secs: None,
        }
    }
}

/// Schedule description for monitor upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MonitorSchedule {
    Crontab { value: String },
    Interval { value: u64, unit: String },
}

/// Monitor configuration sent with a check-in to create or update the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub schedule: MonitorSchedule,

    /// Minutes the monitor may be late before it is considered missed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin_margin: Option<u64>,

    /// Maximum runtime in minutes before the run counts as failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runtime: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_check_in_gets_an_id() {
        let a = CheckIn::new("nightly-backup", CheckInStatus::InProgress);
        let b = CheckIn::new("nightly-backup", CheckInStatus::InProgress);
        assert_ne!(a.check_in_id, b.check_in_id);
    }

    #[test]
    fn schedule_serializes_tagged() {
        let schedule = MonitorSchedule::Crontab {
            value: "0 3 * * *".into(),
        };
        let json = serde_json::to_string(&schedule).unwrap();
        assert!(json.contains("\"type\":\"crontab\""));
    }
}
