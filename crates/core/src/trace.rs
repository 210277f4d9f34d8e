//! Distributed-tracing records carried on the Scope.
//!
//! The client does not run a tracer; it stores the records a tracing
//! integration sets and propagates them into outgoing envelopes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lightweight record of the span an event occurred in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub trace_id: Uuid,

    pub span_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// Operation name (e.g., "http.server")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SpanRecord {
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            span_id: new_span_id(),
            parent_span_id: None,
            op: Some(op.into()),
            description: None,
        }
    }
}

/// Trace continuation state for captures outside any active span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationContext {
    pub trace_id: Uuid,
    pub span_id: String,
}

impl PropagationContext {
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            span_id: new_span_id(),
        }
    }
}

impl Default for PropagationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Propagated metadata used for distributed trace sampling decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicSamplingContext {
    pub trace_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f32>,
}

// Span ids are 16 hex chars; a v4 uuid gives us more than enough entropy.
fn new_span_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}
