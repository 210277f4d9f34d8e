//! Scope — the mutable bag of contextual attributes merged into events.
//!
//! A Scope accumulates user identity, tags, extra data, breadcrumbs, and
//! the rest of the ambient state an application wants attached to whatever
//! it captures next. It knows nothing about delivery: the client snapshots
//! a Scope at capture time and merges it into the outgoing event.
//!
//! Every mutator returns `&mut Self` so configuration chains:
//!
//! ```
//! use emberline_client::Scope;
//! use emberline_core::User;
//!
//! let mut scope = Scope::new();
//! scope.set_tag("env", "prod").set_user(Some(User::with_id("1")));
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use emberline_core::attachment::Attachment;
use emberline_core::breadcrumb::Breadcrumb;
use emberline_core::event::{Event, EventHint, Level};
use emberline_core::session::{RequestSession, Session};
use emberline_core::trace::{PropagationContext, SpanRecord};
use emberline_core::user::User;
use serde::{Deserialize, Serialize};

/// Default cap on the breadcrumb trail.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// A transform run against every event captured with this scope.
///
/// Processors run in registration order; returning `None` drops the event.
pub type EventProcessor = Arc<dyn Fn(Event, &EventHint) -> Option<Event> + Send + Sync>;

/// The mutable context container.
#[derive(Clone, Default)]
pub struct Scope {
    user: Option<User>,
    tags: BTreeMap<String, String>,
    extra: serde_json::Map<String, serde_json::Value>,
    contexts: serde_json::Map<String, serde_json::Value>,
    fingerprint: Vec<String>,
    breadcrumbs: VecDeque<Breadcrumb>,
    attachments: Vec<Attachment>,
    level: Option<Level>,
    span: Option<SpanRecord>,
    session: Option<Session>,
    request_session: Option<RequestSession>,
    propagation_context: Option<PropagationContext>,
    transaction_name: Option<String>,
    event_processors: Vec<EventProcessor>,
    processing_metadata: serde_json::Map<String, serde_json::Value>,
}

/// A partial context record; only the provided fields are merged.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ScopeContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexts: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_session: Option<RequestSession>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagation_context: Option<PropagationContext>,
}

/// The three shapes a scope update can take.
///
/// Replaces the shape-sniffing of dynamic runtimes with a closed union:
/// a partial context record, a whole scope to copy from, or a callback.
pub enum ScopeUpdate {
    Context(ScopeContext),
    Scope(Scope),
    With(Box<dyn FnOnce(&mut Scope) + Send>),
}

impl ScopeUpdate {
    /// An imperative update applied via callback.
    pub fn with(f: impl FnOnce(&mut Scope) + Send + 'static) -> Self {
        ScopeUpdate::With(Box::new(f))
    }
}

impl From<ScopeContext> for ScopeUpdate {
    fn from(context: ScopeContext) -> Self {
        ScopeUpdate::Context(context)
    }
}

impl From<Scope> for ScopeUpdate {
    fn from(scope: Scope) -> Self {
        ScopeUpdate::Scope(scope)
    }
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Mutators (all chainable) ──────────────────────────────────────

    /// Set the user for future events. `None` unsets.
    pub fn set_user(&mut self, user: Option<User>) -> &mut Self {
        self.user = user;
        self
    }

    /// Merge a set of tags; existing keys are overwritten.
    pub fn set_tags<K, V>(&mut self, tags: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a single tag.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Remove a tag if present.
    pub fn remove_tag(&mut self, key: &str) -> &mut Self {
        self.tags.remove(key);
        self
    }

    /// Merge a set of extra values; existing keys are overwritten.
    pub fn set_extras(
        &mut self,
        extras: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> &mut Self {
        self.extra.extend(extras);
        self
    }

    /// Set a single extra value.
    pub fn set_extra(&mut self, key: impl Into<String>, value: serde_json::Value) -> &mut Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Remove an extra value if present.
    pub fn remove_extra(&mut self, key: &str) -> &mut Self {
        self.extra.remove(key);
        self
    }

    /// Replace the grouping fingerprint.
    pub fn set_fingerprint(&mut self, fingerprint: Vec<String>) -> &mut Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Set the level applied to future events. `None` unsets.
    pub fn set_level(&mut self, level: Option<Level>) -> &mut Self {
        self.level = level;
        self
    }

    /// Set the transaction name stamped on future events. `None` unsets.
    pub fn set_transaction_name(&mut self, name: Option<String>) -> &mut Self {
        self.transaction_name = name;
        self
    }

    /// Set a named structured context. `None` unsets.
    pub fn set_context(
        &mut self,
        name: impl Into<String>,
        context: Option<serde_json::Value>,
    ) -> &mut Self {
        let name = name.into();
        match context {
            Some(value) => {
                self.contexts.insert(name, value);
            }
            None => {
                self.contexts.remove(&name);
            }
        }
        self
    }

    /// Set the active span record. `None` unsets.
    pub fn set_span(&mut self, span: Option<SpanRecord>) -> &mut Self {
        self.span = span;
        self
    }

    /// Set the active session. `None` unsets.
    pub fn set_session(&mut self, session: Option<Session>) -> &mut Self {
        self.session = session;
        self
    }

    /// Set the request-session marker. `None` unsets.
    pub fn set_request_session(&mut self, request_session: Option<RequestSession>) -> &mut Self {
        self.request_session = request_session;
        self
    }

    /// Set the trace propagation context.
    pub fn set_propagation_context(&mut self, context: PropagationContext) -> &mut Self {
        self.propagation_context = Some(context);
        self
    }

    /// Merge data visible during processing but never delivered.
    pub fn set_processing_metadata(
        &mut self,
        data: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> &mut Self {
        self.processing_metadata.extend(data);
        self
    }

    /// Append a breadcrumb, evicting the oldest entries once the trail
    /// exceeds `max` (or [`DEFAULT_MAX_BREADCRUMBS`] when omitted).
    pub fn add_breadcrumb(&mut self, breadcrumb: Breadcrumb, max: Option<usize>) -> &mut Self {
        let cap = max.unwrap_or(DEFAULT_MAX_BREADCRUMBS);
        if cap == 0 {
            return self;
        }
        self.breadcrumbs.push_back(breadcrumb);
        while self.breadcrumbs.len() > cap {
            self.breadcrumbs.pop_front();
        }
        self
    }

    /// Append an attachment for future events.
    pub fn add_attachment(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Register an event processor; processors run in registration order.
    pub fn add_event_processor(
        &mut self,
        processor: impl Fn(Event, &EventHint) -> Option<Event> + Send + Sync + 'static,
    ) -> &mut Self {
        self.event_processors.push(Arc::new(processor));
        self
    }

    /// Empty the breadcrumb trail, leaving everything else untouched.
    pub fn clear_breadcrumbs(&mut self) -> &mut Self {
        self.breadcrumbs.clear();
        self
    }

    /// Drop all attachments, leaving everything else untouched.
    pub fn clear_attachments(&mut self) -> &mut Self {
        self.attachments.clear();
        self
    }

    /// Reset every field to its construction-time default.
    pub fn clear(&mut self) -> &mut Self {
        *self = Scope::default();
        self
    }

    /// Apply an update: a partial context, another scope, or a callback.
    pub fn update(&mut self, update: impl Into<ScopeUpdate>) -> &mut Self {
        match update.into() {
            ScopeUpdate::Context(context) => self.apply_context(context),
            ScopeUpdate::Scope(source) => self.apply_scope(source),
            ScopeUpdate::With(f) => {
                f(self);
                self
            }
        }
    }

    fn apply_context(&mut self, context: ScopeContext) -> &mut Self {
        if let Some(user) = context.user {
            self.user = Some(user);
        }
        if let Some(level) = context.level {
            self.level = Some(level);
        }
        if let Some(extra) = context.extra {
            self.extra.extend(extra);
        }
        if let Some(contexts) = context.contexts {
            self.contexts.extend(contexts);
        }
        if let Some(tags) = context.tags {
            self.tags.extend(tags);
        }
        if let Some(fingerprint) = context.fingerprint {
            self.fingerprint = fingerprint;
        }
        if let Some(request_session) = context.request_session {
            self.request_session = Some(request_session);
        }
        if let Some(propagation_context) = context.propagation_context {
            self.propagation_context = Some(propagation_context);
        }
        self
    }

    fn apply_scope(&mut self, source: Scope) -> &mut Self {
        self.tags.extend(source.tags);
        self.extra.extend(source.extra);
        self.contexts.extend(source.contexts);
        if source.user.is_some() {
            self.user = source.user;
        }
        if source.level.is_some() {
            self.level = source.level;
        }
        if !source.fingerprint.is_empty() {
            self.fingerprint = source.fingerprint;
        }
        if source.request_session.is_some() {
            self.request_session = source.request_session;
        }
        if source.propagation_context.is_some() {
            self.propagation_context = source.propagation_context;
        }
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn span(&self) -> Option<&SpanRecord> {
        self.span.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn request_session(&self) -> Option<&RequestSession> {
        self.request_session.as_ref()
    }

    pub fn propagation_context(&self) -> Option<&PropagationContext> {
        self.propagation_context.as_ref()
    }

    pub fn last_breadcrumb(&self) -> Option<&Breadcrumb> {
        self.breadcrumbs.back()
    }

    pub fn breadcrumbs(&self) -> impl Iterator<Item = &Breadcrumb> {
        self.breadcrumbs.iter()
    }

    pub fn breadcrumb_count(&self) -> usize {
        self.breadcrumbs.len()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn processor_count(&self) -> usize {
        self.event_processors.len()
    }

    // ── Event merging ─────────────────────────────────────────────────

    /// Merge this scope into an event, then run the processor chain.
    ///
    /// Merge rules: scope data fills in, event-specific map entries win on
    /// key collisions; a scope-set level or transaction name overrides the
    /// event's; fingerprints concatenate; breadcrumbs append after the
    /// event's own and the merged trail keeps only the newest
    /// `max_breadcrumbs`. Returns `None` when any processor drops the
    /// event.
    pub fn apply_to_event(
        &self,
        mut event: Event,
        hint: &EventHint,
        max_breadcrumbs: usize,
    ) -> Option<Event> {
        for (key, value) in &self.tags {
            event.tags.entry(key.clone()).or_insert_with(|| value.clone());
        }
        for (key, value) in &self.extra {
            if !event.extra.contains_key(key) {
                event.extra.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &self.contexts {
            if !event.contexts.contains_key(key) {
                event.contexts.insert(key.clone(), value.clone());
            }
        }
        if event.user.is_none() {
            event.user = self.user.clone();
        }
        if let Some(level) = self.level {
            event.level = level;
        }
        if let Some(transaction) = &self.transaction_name {
            event.transaction = Some(transaction.clone());
        }
        if !self.fingerprint.is_empty() {
            event.fingerprint.extend(self.fingerprint.iter().cloned());
        }
        if let Some(span) = &self.span {
            if !event.contexts.contains_key("trace") {
                event.contexts.insert(
                    "trace".into(),
                    serde_json::json!({
                        "trace_id": span.trace_id.simple().to_string(),
                        "span_id": span.span_id,
                        "parent_span_id": span.parent_span_id,
                        "op": span.op,
                    }),
                );
            }
        }
        event.breadcrumbs.extend(self.breadcrumbs.iter().cloned());
        if event.breadcrumbs.len() > max_breadcrumbs {
            let excess = event.breadcrumbs.len() - max_breadcrumbs;
            event.breadcrumbs.drain(..excess);
        }
        for (key, value) in &self.processing_metadata {
            event
                .processing_metadata
                .insert(key.clone(), value.clone());
        }

        for processor in &self.event_processors {
            event = processor(event, hint)?;
        }
        Some(event)
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("user", &self.user)
            .field("tags", &self.tags)
            .field("extra_keys", &self.extra.len())
            .field("context_keys", &self.contexts.len())
            .field("fingerprint", &self.fingerprint)
            .field("breadcrumbs", &self.breadcrumbs.len())
            .field("attachments", &self.attachments.len())
            .field("level", &self.level)
            .field("transaction_name", &self.transaction_name)
            .field("event_processors", &self.event_processors.len())
            .finish()
    }
}
