//! Hook bus — typed publish/subscribe for client lifecycle notifications.
//!
//! Hooks are a closed set: each [`HookKind`] has exactly one payload shape,
//! carried by the matching [`HookEvent`] variant. Callbacks for a kind fire
//! synchronously in registration order. Emitting a kind nobody subscribed
//! to is a no-op, so optional capabilities degrade silently.

use std::collections::HashMap;
use std::sync::Arc;

use emberline_core::breadcrumb::{Breadcrumb, BreadcrumbHint};
use emberline_core::envelope::Envelope;
use emberline_core::event::Event;
use emberline_core::trace::{DynamicSamplingContext, SpanRecord};
use emberline_core::transport::TransportResponse;

/// The closed set of lifecycle hooks a client can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    StartTransaction,
    FinishTransaction,
    BeforeEnvelope,
    AfterSendEvent,
    BeforeAddBreadcrumb,
    CreateDsc,
}

/// A hook notification with its statically typed payload.
#[derive(Debug, Clone)]
pub enum HookEvent {
    StartTransaction(SpanRecord),
    FinishTransaction(SpanRecord),
    /// The envelope is about to be handed to the transport.
    BeforeEnvelope(Arc<Envelope>),
    /// Delivery settled; `response` is absent when the send failed.
    AfterSendEvent {
        event: Arc<Event>,
        response: Option<TransportResponse>,
    },
    /// A breadcrumb is about to be recorded on the bound scope.
    BeforeAddBreadcrumb {
        breadcrumb: Breadcrumb,
        hint: Option<BreadcrumbHint>,
    },
    /// A dynamic sampling context was assembled for an outgoing envelope.
    CreateDsc(DynamicSamplingContext),
}

impl HookEvent {
    /// The kind this payload belongs to.
    pub fn kind(&self) -> HookKind {
        match self {
            HookEvent::StartTransaction(_) => HookKind::StartTransaction,
            HookEvent::FinishTransaction(_) => HookKind::FinishTransaction,
            HookEvent::BeforeEnvelope(_) => HookKind::BeforeEnvelope,
            HookEvent::AfterSendEvent { .. } => HookKind::AfterSendEvent,
            HookEvent::BeforeAddBreadcrumb { .. } => HookKind::BeforeAddBreadcrumb,
            HookEvent::CreateDsc(_) => HookKind::CreateDsc,
        }
    }
}

/// A registered hook callback.
pub type HookCallback = Arc<dyn Fn(&HookEvent) + Send + Sync>;

/// Ordered callback lists keyed by hook kind.
#[derive(Default)]
pub struct HookBus {
    callbacks: HashMap<HookKind, Vec<HookCallback>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback to the list for `kind`.
    pub fn on(&mut self, kind: HookKind, callback: impl Fn(&HookEvent) + Send + Sync + 'static) {
        self.callbacks
            .entry(kind)
            .or_default()
            .push(Arc::new(callback));
    }

    /// Whether anyone subscribed to `kind`.
    ///
    /// Lets emitters skip assembling payloads nobody will see.
    pub fn has(&self, kind: HookKind) -> bool {
        self.callbacks
            .get(&kind)
            .is_some_and(|list| !list.is_empty())
    }

    /// Snapshot the callback list for the event's kind.
    ///
    /// Callers invoke the snapshot after releasing any lock around the bus;
    /// callbacks may re-enter the client and register further hooks.
    pub fn subscribers(&self, kind: HookKind) -> Vec<HookCallback> {
        self.callbacks.get(&kind).cloned().unwrap_or_default()
    }

    /// Fire every callback registered for the event's kind, in order.
    pub fn emit(&self, event: &HookEvent) {
        if let Some(list) = self.callbacks.get(&event.kind()) {
            for callback in list {
                callback(event);
            }
        }
    }
}

impl std::fmt::Debug for HookBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<HookKind, usize> = self
            .callbacks
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("HookBus").field("callbacks", &counts).finish()
    }
}
