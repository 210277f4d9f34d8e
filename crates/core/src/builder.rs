//! EventBuilder trait — the abstraction over event construction.
//!
//! Turning a raw thrown value or message into an [`Event`] may involve
//! expensive context extraction (stack traces, source lookups), so the
//! contract is async and lives behind a trait the client suspends on.

use async_trait::async_trait;

use crate::error::BuildError;
use crate::event::{Event, EventHint, Level};

/// The closed set of things an application can report as an exception.
///
/// Replaces the untyped "any thrown value" input of dynamic runtimes with a
/// tagged union the builder resolves.
#[derive(Debug)]
pub enum ThrownValue {
    /// A structured error with a source chain
    Error {
        error: Box<dyn std::error::Error + Send + Sync + 'static>,
        /// Concrete type name, captured at the wrap site
        type_name: &'static str,
    },
    /// A bare string
    Message(String),
    /// An arbitrary structured value
    Value(serde_json::Value),
}

impl ThrownValue {
    /// Wrap a structured error.
    ///
    /// A blanket `From<E: Error>` would collide with the `From<String>`
    /// conversion under coherence rules, so errors go through this
    /// constructor instead.
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ThrownValue::Error {
            error: Box::new(err),
            type_name: std::any::type_name::<E>(),
        }
    }
}

impl From<String> for ThrownValue {
    fn from(message: String) -> Self {
        ThrownValue::Message(message)
    }
}

impl From<&str> for ThrownValue {
    fn from(message: &str) -> Self {
        ThrownValue::Message(message.to_string())
    }
}

impl From<serde_json::Value> for ThrownValue {
    fn from(value: serde_json::Value) -> Self {
        ThrownValue::Value(value)
    }
}

/// The event-construction contract.
#[async_trait]
pub trait EventBuilder: Send + Sync {
    /// Build an event from a thrown value.
    async fn event_from_exception(
        &self,
        thrown: ThrownValue,
        hint: &EventHint,
    ) -> Result<Event, BuildError>;

    /// Build an event from a plain message at the given level.
    async fn event_from_message(
        &self,
        message: &str,
        level: Level,
        hint: &EventHint,
    ) -> Result<Event, BuildError>;
}
