//! Session and request-session records.
//!
//! These are storage-only aggregates tracked alongside captured events;
//! health bookkeeping happens on the delivery side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a release-health session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Ok,
    Exited,
    Crashed,
    Abandoned,
}

/// A release-health session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session id
    pub session_id: Uuid,

    /// Stable identifier of the user or device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_id: Option<String>,

    pub status: SessionStatus,

    /// Errors observed during the session
    pub errors: u32,

    pub started: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl Session {
    /// Start a fresh, healthy session.
    pub fn start() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            distinct_id: None,
            status: SessionStatus::Ok,
            errors: 0,
            started: Utc::now(),
            release: None,
            environment: None,
        }
    }
}

/// Status of the request-scoped session slot on a Scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestSessionStatus {
    Ok,
    Errored,
    Crashed,
}

/// A per-request session marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSession {
    pub status: RequestSessionStatus,
}

impl RequestSession {
    pub fn ok() -> Self {
        Self {
            status: RequestSessionStatus::Ok,
        }
    }
}
