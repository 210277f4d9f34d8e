//! Breadcrumb domain types.
//!
//! Breadcrumbs are timestamped trail entries recording prior application
//! activity. The Scope keeps a bounded FIFO of them and merges the trail
//! into outgoing events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Level;

/// Side-channel data passed alongside a breadcrumb to hooks; never serialized.
pub type BreadcrumbHint = serde_json::Map<String, serde_json::Value>;

/// A single trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// When the activity happened
    pub timestamp: DateTime<Utc>,

    /// Breadcrumb type understood by the delivery side
    #[serde(rename = "type")]
    pub ty: String,

    /// Dotted category (e.g., "http", "ui.click")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Severity of the recorded activity
    pub level: Level,

    /// Arbitrary structured data
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Default for Breadcrumb {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            ty: "default".into(),
            category: None,
            message: None,
            level: Level::Info,
            data: serde_json::Map::new(),
        }
    }
}

impl Breadcrumb {
    /// Create a breadcrumb with a message in the given category.
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_breadcrumb_is_info() {
        let crumb = Breadcrumb::default();
        assert_eq!(crumb.ty, "default");
        assert_eq!(crumb.level, Level::Info);
    }

    #[test]
    fn new_sets_category_and_message() {
        let crumb = Breadcrumb::new("http", "GET /health");
        assert_eq!(crumb.category.as_deref(), Some("http"));
        assert_eq!(crumb.message.as_deref(), Some("GET /health"));
    }

    #[test]
    fn serializes_type_field_name() {
        let crumb = Breadcrumb::default();
        let json = serde_json::to_string(&crumb).unwrap();
        assert!(json.contains("\"type\":\"default\""));
    }
}
