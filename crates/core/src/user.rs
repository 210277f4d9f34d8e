//! User identity record attached to events.

use serde::{Deserialize, Serialize};

/// The user an event is associated with.
///
/// All fields are optional; the Scope stores the record with
/// replace-whole-value semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// Additional arbitrary attributes
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Create a user identified by id only.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_id_sets_only_id() {
        let user = User::with_id("1");
        assert_eq!(user.id.as_deref(), Some("1"));
        assert!(user.email.is_none());
    }

    #[test]
    fn empty_fields_are_omitted_from_json() {
        let user = User::with_id("1");
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, "{\"id\":\"1\"}");
    }
}
