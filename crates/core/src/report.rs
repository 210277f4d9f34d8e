//! Drop-accounting vocabulary and the client-report payload.
//!
//! When the client discards an event instead of delivering it, the loss is
//! recorded per `(reason, category)` pair and can later be shipped to the
//! delivery side as a [`ClientReport`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an event was dropped instead of delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// A scope event processor returned nothing
    EventProcessor,
    /// The before-send callback rejected the event
    BeforeSend,
    /// The sampling decision discarded the event
    SampleRate,
    /// The transport failed to deliver
    NetworkError,
    /// Dropped locally while the transport is rate limited
    RatelimitBackoff,
    /// A failure inside the client itself
    Internal,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DropReason::EventProcessor => "event_processor",
            DropReason::BeforeSend => "before_send",
            DropReason::SampleRate => "sample_rate",
            DropReason::NetworkError => "network_error",
            DropReason::RatelimitBackoff => "ratelimit_backoff",
            DropReason::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// The kind of payload an accounting entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// An error or message event
    Error,
    /// A transaction event
    Transaction,
    /// A release-health session
    Session,
    /// A binary attachment
    Attachment,
    /// A cron monitor check-in
    CheckIn,
    /// Client-internal payloads (e.g., client reports themselves)
    Internal,
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataCategory::Error => "error",
            DataCategory::Transaction => "transaction",
            DataCategory::Session => "session",
            DataCategory::Attachment => "attachment",
            DataCategory::CheckIn => "check_in",
            DataCategory::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// One line of a client report: how many payloads of one category were lost
/// for one reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedEvent {
    pub reason: DropReason,
    pub category: DataCategory,
    pub quantity: u32,
}

/// Self-report of everything the client dropped since the last report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientReport {
    pub timestamp: DateTime<Utc>,
    pub discarded_events: Vec<DiscardedEvent>,
}

impl ClientReport {
    pub fn new(discarded_events: Vec<DiscardedEvent>) -> Self {
        Self {
            timestamp: Utc::now(),
            discarded_events,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.discarded_events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_display_as_wire_names() {
        assert_eq!(DropReason::EventProcessor.to_string(), "event_processor");
        assert_eq!(DropReason::RatelimitBackoff.to_string(), "ratelimit_backoff");
        assert_eq!(DataCategory::CheckIn.to_string(), "check_in");
    }

    #[test]
    fn reason_serde_matches_display() {
        let json = serde_json::to_string(&DropReason::BeforeSend).unwrap();
        assert_eq!(json, "\"before_send\"");
        let json = serde_json::to_string(&DataCategory::Session).unwrap();
        assert_eq!(json, "\"session\"");
    }
}
