//! Event domain types.
//!
//! An [`Event`] is the normalized record describing an exception, message,
//! or custom occurrence on its way to delivery. The client treats it as a
//! mutable record: Scope data is merged in and event processors may enrich
//! or discard it before it reaches the transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::breadcrumb::Breadcrumb;
use crate::user::User;

/// Unique identifier for a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Severity of an event or breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Default for Level {
    fn default() -> Self {
        Level::Error
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        };
        write!(f, "{s}")
    }
}

/// A single exception in an event's exception chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionValue {
    /// Exception type name (e.g., "io::Error")
    #[serde(rename = "type")]
    pub ty: String,

    /// Human-readable message
    pub value: String,

    /// Module or crate the exception originated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

/// The normalized event record.
///
/// Fields mirror what the delivery side understands; everything optional is
/// filled in either by the caller, the Scope merge, or event processors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID, assigned at construction
    pub event_id: EventId,

    /// When the event occurred
    pub timestamp: DateTime<Utc>,

    /// Severity
    pub level: Level,

    /// Log message for message events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Logger name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,

    /// Transaction / route name the event occurred in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,

    /// Release identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    /// Deployment environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Exception chain, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<ExceptionValue>,

    /// Grouping fingerprint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fingerprint: Vec<String>,

    /// Key/value tags; keys unique, ordered
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    /// Arbitrary extra data
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,

    /// Structured contexts (os, device, trace, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub contexts: serde_json::Map<String, serde_json::Value>,

    /// Trail of breadcrumbs leading up to the event
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<Breadcrumb>,

    /// Affected user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    /// Data visible during processing only; never serialized downstream
    #[serde(skip)]
    pub processing_metadata: serde_json::Map<String, serde_json::Value>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: Utc::now(),
            level: Level::default(),
            message: None,
            logger: None,
            transaction: None,
            release: None,
            environment: None,
            exceptions: Vec::new(),
            fingerprint: Vec::new(),
            tags: BTreeMap::new(),
            extra: serde_json::Map::new(),
            contexts: serde_json::Map::new(),
            breadcrumbs: Vec::new(),
            user: None,
            processing_metadata: serde_json::Map::new(),
        }
    }
}

impl Event {
    /// Create an empty event with a fresh id and the current timestamp.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message event at the given level.
    pub fn from_message(message: impl Into<String>, level: Level) -> Self {
        Self {
            message: Some(message.into()),
            level,
            ..Self::default()
        }
    }

    /// Whether the event carries an exception chain.
    pub fn is_exception(&self) -> bool {
        !self.exceptions.is_empty()
    }
}

/// Additional information accompanying a capture call.
///
/// Hints travel alongside the event through processors but are never
/// serialized into the delivered payload.
#[derive(Debug, Clone, Default)]
pub struct EventHint {
    /// Pre-assigned event id (forces the pipeline to keep it)
    pub event_id: Option<EventId>,

    /// The original message as passed to capture, before processing
    pub original_message: Option<String>,

    /// Arbitrary structured data for processors
    pub payload: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_displays_as_simple_hex() {
        let id = EventId::new();
        let s = id.to_string();
        assert_eq!(s.len(), 32);
        assert!(!s.contains('-'));
    }

    #[test]
    fn level_serializes_lowercase() {
        let json = serde_json::to_string(&Level::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn default_event_is_error_level() {
        let event = Event::new();
        assert_eq!(event.level, Level::Error);
        assert!(!event.is_exception());
    }

    #[test]
    fn message_event_carries_message_and_level() {
        let event = Event::from_message("boom", Level::Info);
        assert_eq!(event.message.as_deref(), Some("boom"));
        assert_eq!(event.level, Level::Info);
    }

    #[test]
    fn processing_metadata_is_not_serialized() {
        let mut event = Event::new();
        event
            .processing_metadata
            .insert("secret".into(), serde_json::json!(42));
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("secret"));
    }
}
