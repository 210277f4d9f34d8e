//! Client — capture orchestration, delivery hand-off, and lifecycle.
//!
//! The client merges Scope context into captured events, runs them through
//! the processing pipeline, and spawns delivery onto the async runtime.
//! Processing (scope merge, event processors, before_send) completes before
//! a capture call returns; only the transport send races in the background,
//! tracked so `flush`/`close` can wait for it within a bounded time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use emberline_core::breadcrumb::{Breadcrumb, BreadcrumbHint};
use emberline_core::builder::{EventBuilder, ThrownValue};
use emberline_core::checkin::{CheckIn, MonitorConfig};
use emberline_core::dsn::Dsn;
use emberline_core::envelope::{Envelope, EnvelopeItem};
use emberline_core::error::TransportError;
use emberline_core::event::{Event, EventHint, EventId, Level};
use emberline_core::report::{DataCategory, DropReason};
use emberline_core::session::Session;
use emberline_core::trace::DynamicSamplingContext;
use emberline_core::transport::Transport;

use crate::builder::BasicEventBuilder;
use crate::drain::InFlight;
use crate::hooks::{HookBus, HookEvent, HookKind};
use crate::integration::{Integration, IntegrationRegistry};
use crate::options::{ClientOptions, SdkMetadata};
use crate::report::DropAccounting;
use crate::scope::Scope;

struct ClientInner {
    options: ClientOptions,
    builder: Arc<dyn EventBuilder>,
    /// Lazily constructed on first send
    transport: OnceLock<Option<Arc<dyn Transport>>>,
    scope: RwLock<Scope>,
    hooks: RwLock<HookBus>,
    integrations: Mutex<IntegrationRegistry>,
    accounting: DropAccounting,
    in_flight: InFlight,
    enabled: AtomicBool,
    rate_limited_until: Mutex<Option<Instant>>,
}

/// The telemetry client.
///
/// Cheap to clone; clones share all state. Capture methods never fail
/// toward the caller: anything that goes wrong is translated into drop
/// accounting and a `None` event id.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Construct a client from options; enabled unless the options say
    /// otherwise.
    pub fn new(options: ClientOptions) -> Self {
        let builder = options
            .event_builder
            .clone()
            .unwrap_or_else(|| Arc::new(BasicEventBuilder));
        let enabled = AtomicBool::new(options.enabled);
        Self {
            inner: Arc::new(ClientInner {
                options,
                builder,
                transport: OnceLock::new(),
                scope: RwLock::new(Scope::new()),
                hooks: RwLock::new(HookBus::new()),
                integrations: Mutex::new(IntegrationRegistry::new()),
                accounting: DropAccounting::new(),
                in_flight: InFlight::new(),
                enabled,
                rate_limited_until: Mutex::new(None),
            }),
        }
    }

    // ── Capture ───────────────────────────────────────────────────────

    /// Capture an exception-like value.
    ///
    /// Returns the event id once processing settles, or `None` when the
    /// client is disabled or the event was dropped along the way. Delivery
    /// itself is fire-and-forget.
    pub async fn capture_exception(
        &self,
        exception: impl Into<ThrownValue>,
        hint: Option<EventHint>,
        scope: Option<&Scope>,
    ) -> Option<EventId> {
        if !self.is_enabled() {
            return None;
        }
        let hint = hint.unwrap_or_default();
        let scope = self.effective_scope(scope);
        let event = match self
            .inner
            .builder
            .event_from_exception(exception.into(), &hint)
            .await
        {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "Event construction failed");
                self.record_dropped_event(DropReason::Internal, DataCategory::Error, None);
                return None;
            }
        };
        self.process_event(event, hint, scope)
    }

    /// Capture a message at the given level.
    pub async fn capture_message(
        &self,
        message: &str,
        level: Level,
        hint: Option<EventHint>,
        scope: Option<&Scope>,
    ) -> Option<EventId> {
        if !self.is_enabled() {
            return None;
        }
        let hint = hint.unwrap_or_default();
        let scope = self.effective_scope(scope);
        let event = match self
            .inner
            .builder
            .event_from_message(message, level, &hint)
            .await
        {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "Event construction failed");
                self.record_dropped_event(DropReason::Internal, DataCategory::Error, None);
                return None;
            }
        };
        self.process_event(event, hint, scope)
    }

    /// Capture a pre-built event as-is.
    pub fn capture_event(
        &self,
        event: Event,
        hint: Option<EventHint>,
        scope: Option<&Scope>,
    ) -> Option<EventId> {
        if !self.is_enabled() {
            return None;
        }
        let hint = hint.unwrap_or_default();
        let scope = self.effective_scope(scope);
        self.process_event(event, hint, scope)
    }

    /// Run the processing pipeline synchronously, then spawn delivery.
    fn process_event(&self, mut event: Event, hint: EventHint, scope: Scope) -> Option<EventId> {
        let options = &self.inner.options;
        let event_id = hint.event_id.unwrap_or(event.event_id);
        event.event_id = event_id;
        if event.release.is_none() {
            event.release = options.release.clone();
        }
        if event.environment.is_none() {
            event.environment = options.environment.clone();
        }

        if options.sample_rate < 1.0 && rand::random::<f32>() >= options.sample_rate {
            debug!(event_id = %event_id, "Event discarded by sampling");
            self.record_dropped_event(DropReason::SampleRate, DataCategory::Error, Some(&event));
            return None;
        }

        let attachments = scope.attachments().to_vec();
        let propagation = scope.propagation_context().cloned();

        let Some(event) = scope.apply_to_event(event, &hint, options.max_breadcrumbs) else {
            debug!(event_id = %event_id, "Event dropped by event processor");
            self.record_dropped_event(DropReason::EventProcessor, DataCategory::Error, None);
            return None;
        };

        let event = match &options.before_send {
            Some(before_send) => match before_send(event) {
                Some(event) => event,
                None => {
                    debug!(event_id = %event_id, "Event rejected by before_send");
                    self.record_dropped_event(DropReason::BeforeSend, DataCategory::Error, None);
                    return None;
                }
            },
            None => event,
        };

        let client = self.clone();
        self.spawn_tracked(DataCategory::Error, async move {
            client.deliver_event(event, attachments, propagation).await;
        });
        Some(event_id)
    }

    /// Submit an already-processed event, bypassing scope merge and
    /// processors. Delivery is fire-and-forget and tracked for drains.
    pub fn send_event(&self, event: Event) {
        let client = self.clone();
        self.spawn_tracked(DataCategory::Error, async move {
            client.deliver_event(event, Vec::new(), None).await;
        });
    }

    /// Deliver one event envelope; runs on a spawned task.
    async fn deliver_event(
        &self,
        event: Event,
        attachments: Vec<emberline_core::attachment::Attachment>,
        propagation: Option<emberline_core::trace::PropagationContext>,
    ) {
        if self.is_rate_limited() {
            debug!(event_id = %event.event_id, "Rate limit active; event dropped locally");
            self.record_dropped_event(
                DropReason::RatelimitBackoff,
                DataCategory::Error,
                Some(&event),
            );
            return;
        }
        let Some(transport) = self.transport_or_init() else {
            debug!(event_id = %event.event_id, "No transport configured; event dropped");
            self.record_dropped_event(DropReason::Internal, DataCategory::Error, Some(&event));
            return;
        };

        let event = Arc::new(event);
        let mut envelope = Envelope::from_event((*event).clone(), attachments);
        if let Some(propagation) = propagation {
            let dsc = self.dynamic_sampling_context(propagation.trace_id);
            self.emit(&HookEvent::CreateDsc(dsc.clone()));
            envelope.trace = Some(dsc);
        }
        if self.has_hook(HookKind::BeforeEnvelope) {
            self.emit(&HookEvent::BeforeEnvelope(Arc::new(envelope.clone())));
        }

        match transport.send(envelope).await {
            Ok(response) => {
                debug!(event_id = %event.event_id, "Event delivered");
                self.emit(&HookEvent::AfterSendEvent {
                    event,
                    response: Some(response),
                });
            }
            Err(TransportError::RateLimited { retry_after_secs }) => {
                warn!(retry_after_secs, "Transport rate limited; backing off");
                self.set_rate_limit(Duration::from_secs(retry_after_secs));
                self.record_dropped_event(DropReason::RatelimitBackoff, DataCategory::Error, None);
                self.emit(&HookEvent::AfterSendEvent {
                    event,
                    response: None,
                });
            }
            Err(e) => {
                warn!(error = %e, "Event delivery failed");
                self.record_dropped_event(DropReason::NetworkError, DataCategory::Error, None);
                self.emit(&HookEvent::AfterSendEvent {
                    event,
                    response: None,
                });
            }
        }
    }

    // ── Sessions & check-ins ──────────────────────────────────────────

    /// Forward a session to the transport; no scope merging.
    pub fn capture_session(&self, session: Session) {
        if !self.is_enabled() {
            return;
        }
        self.send_session(session);
    }

    /// Submit a session envelope.
    pub fn send_session(&self, session: Session) {
        let client = self.clone();
        self.spawn_tracked(DataCategory::Session, async move {
            let Some(transport) = client.transport_or_init() else {
                client.record_dropped_event(DropReason::Internal, DataCategory::Session, None);
                return;
            };
            let mut envelope = Envelope::new();
            envelope.add_item(EnvelopeItem::Session(session));
            match transport.send(envelope).await {
                Ok(_) => debug!("Session delivered"),
                Err(TransportError::RateLimited { retry_after_secs }) => {
                    client.set_rate_limit(Duration::from_secs(retry_after_secs));
                    client.record_dropped_event(
                        DropReason::RatelimitBackoff,
                        DataCategory::Session,
                        None,
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Session delivery failed");
                    client.record_dropped_event(
                        DropReason::NetworkError,
                        DataCategory::Session,
                        None,
                    );
                }
            }
        });
    }

    /// Forward a cron check-in; the check-in id is returned synchronously
    /// while delivery runs in the background.
    pub fn capture_check_in(
        &self,
        check_in: CheckIn,
        monitor_config: Option<MonitorConfig>,
    ) -> Uuid {
        let check_in_id = check_in.check_in_id;
        if !self.is_enabled() {
            return check_in_id;
        }
        let client = self.clone();
        self.spawn_tracked(DataCategory::CheckIn, async move {
            let Some(transport) = client.transport_or_init() else {
                client.record_dropped_event(DropReason::Internal, DataCategory::CheckIn, None);
                return;
            };
            let mut envelope = Envelope::new();
            envelope.add_item(EnvelopeItem::CheckIn {
                check_in,
                monitor_config,
            });
            match transport.send(envelope).await {
                Ok(_) => debug!(check_in_id = %check_in_id, "Check-in delivered"),
                Err(e) => {
                    warn!(error = %e, "Check-in delivery failed");
                    client.record_dropped_event(
                        DropReason::NetworkError,
                        DataCategory::CheckIn,
                        None,
                    );
                }
            }
        });
        check_in_id
    }

    // ── Breadcrumbs ───────────────────────────────────────────────────

    /// Record a breadcrumb on the bound scope.
    pub fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.add_breadcrumb_with_hint(breadcrumb, None);
    }

    /// Record a breadcrumb with a hint for `BeforeAddBreadcrumb`
    /// subscribers.
    pub fn add_breadcrumb_with_hint(
        &self,
        breadcrumb: Breadcrumb,
        hint: Option<BreadcrumbHint>,
    ) {
        if !self.is_enabled() {
            return;
        }
        let max = self.inner.options.max_breadcrumbs;
        if max == 0 {
            return;
        }
        if self.has_hook(HookKind::BeforeAddBreadcrumb) {
            self.emit(&HookEvent::BeforeAddBreadcrumb {
                breadcrumb: breadcrumb.clone(),
                hint,
            });
        }
        self.configure_scope(|scope| {
            scope.add_breadcrumb(breadcrumb, Some(max));
        });
    }

    // ── Scope access ──────────────────────────────────────────────────

    /// Mutate the client-bound scope.
    ///
    /// This is the explicit replacement for an ambient "current scope":
    /// captures without an explicit scope argument snapshot this one.
    pub fn configure_scope<R>(&self, f: impl FnOnce(&mut Scope) -> R) -> R {
        let mut scope = self
            .inner
            .scope
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut scope)
    }

    fn effective_scope(&self, explicit: Option<&Scope>) -> Scope {
        match explicit {
            Some(scope) => scope.clone(),
            None => self
                .inner
                .scope
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    // ── Drop accounting ───────────────────────────────────────────────

    /// Record that an event was dropped instead of delivered.
    ///
    /// Pure bookkeeping: infallible and callable while disabled.
    pub fn record_dropped_event(
        &self,
        reason: DropReason,
        category: DataCategory,
        event: Option<&Event>,
    ) {
        self.inner.accounting.record(reason, category, 1);
        debug!(
            reason = %reason,
            category = %category,
            event_id = ?event.map(|e| e.event_id),
            "Recorded dropped event"
        );
    }

    /// Current drop counter for one `(reason, category)` pair.
    pub fn dropped_event_count(&self, reason: DropReason, category: DataCategory) -> u32 {
        self.inner.accounting.count(reason, category)
    }

    /// Drain the drop ledger into a client-report envelope and submit it.
    pub fn flush_client_report(&self) {
        if self.transport_or_init().is_none() {
            return;
        }
        let Some(report) = self.inner.accounting.take_client_report() else {
            return;
        };
        let client = self.clone();
        self.spawn_tracked(DataCategory::Internal, async move {
            // transport_or_init succeeded above; the reference is cached
            let Some(transport) = client.transport_or_init() else {
                return;
            };
            let mut envelope = Envelope::new();
            envelope.add_item(EnvelopeItem::ClientReport(report));
            if let Err(e) = transport.send(envelope).await {
                debug!(error = %e, "Client report delivery failed");
            }
        });
    }

    // ── Integrations ──────────────────────────────────────────────────

    /// Register an integration; a second registration under the same name
    /// is a no-op.
    pub fn add_integration(&self, integration: Arc<dyn Integration>) {
        self.inner
            .integrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(integration);
    }

    /// Look up a registered integration by name.
    pub fn integration(&self, name: &str) -> Option<Arc<dyn Integration>> {
        self.inner
            .integrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Run each registered integration's one-time setup, in registration
    /// order. Only the first call does anything.
    pub fn setup_integrations(&self) {
        // Snapshot outside the lock: setup callbacks receive the client
        // and may register further integrations.
        let pending = self
            .inner
            .integrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_pending_setup();
        let Some(integrations) = pending else {
            return;
        };
        for integration in integrations {
            if let Err(e) = integration.setup_once(self) {
                warn!(integration = %integration.name(), error = %e, "Integration setup failed");
            }
        }
    }

    // ── Hooks ─────────────────────────────────────────────────────────

    /// Register a callback for a hook kind.
    pub fn on(&self, kind: HookKind, callback: impl Fn(&HookEvent) + Send + Sync + 'static) {
        self.inner
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .on(kind, callback);
    }

    /// Fire a hook; callbacks run synchronously in registration order.
    pub fn emit(&self, event: &HookEvent) {
        let subscribers = self
            .inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers(event.kind());
        for callback in subscribers {
            callback(event);
        }
    }

    fn has_hook(&self, kind: HookKind) -> bool {
        self.inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has(kind)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────

    /// Wait for in-flight deliveries to settle.
    ///
    /// Resolves `true` once everything submitted has completed, `false`
    /// when `timeout` elapsed first. A timeout never aborts a send; late
    /// sends finish in the background and their hooks still fire. The
    /// client stays enabled and `flush` may be called repeatedly.
    pub async fn flush(&self, timeout: Option<Duration>) -> bool {
        self.inner.in_flight.drained(timeout).await
    }

    /// Flush, then disable the client regardless of the outcome.
    ///
    /// Drains the drop ledger as a client report first. After `close`
    /// resolves, capture methods return `None` without side effects;
    /// `record_dropped_event` keeps working for drain-period events.
    pub async fn close(&self, timeout: Option<Duration>) -> bool {
        self.flush_client_report();
        let drained = self.flush(timeout).await;
        self.inner.enabled.store(false, Ordering::SeqCst);
        debug!(drained, "Client closed");
        drained
    }

    /// `close` bounded by the configured shutdown timeout.
    pub async fn shutdown(&self) -> bool {
        self.close(Some(self.inner.options.shutdown_timeout)).await
    }

    /// Whether capture calls are currently accepted.
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn dsn(&self) -> Option<&Dsn> {
        self.inner.options.dsn.as_ref()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    pub fn sdk_metadata(&self) -> &SdkMetadata {
        &self.inner.options.sdk_metadata
    }

    /// The transport, if one has been constructed already.
    ///
    /// Lazily initialized: `None` until the first delivery needed it.
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.inner.transport.get().cloned().flatten()
    }

    // ── Internals ─────────────────────────────────────────────────────

    fn transport_or_init(&self) -> Option<Arc<dyn Transport>> {
        self.inner
            .transport
            .get_or_init(|| {
                self.inner.options.transport.as_ref().map(|factory| {
                    let transport = factory(&self.inner.options);
                    debug!(transport = %transport.name(), "Transport initialized");
                    transport
                })
            })
            .clone()
    }

    /// Spawn a tracked delivery task; without a runtime the payload is
    /// dropped and accounted instead of panicking.
    fn spawn_tracked(
        &self,
        category: DataCategory,
        task: impl Future<Output = ()> + Send + 'static,
    ) {
        let guard = self.inner.in_flight.begin();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _guard = guard;
                    task.await;
                });
            }
            Err(_) => {
                drop(guard);
                debug!("No async runtime available; delivery skipped");
                self.record_dropped_event(DropReason::Internal, category, None);
            }
        }
    }

    fn is_rate_limited(&self) -> bool {
        self.inner
            .rate_limited_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    fn set_rate_limit(&self, retry_after: Duration) {
        let mut until = self
            .inner
            .rate_limited_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *until = Some(Instant::now() + retry_after);
    }

    fn dynamic_sampling_context(&self, trace_id: Uuid) -> DynamicSamplingContext {
        let options = &self.inner.options;
        DynamicSamplingContext {
            trace_id,
            public_key: options.dsn.as_ref().map(|dsn| dsn.public_key.clone()),
            release: options.release.clone(),
            environment: options.environment.clone(),
            sample_rate: Some(options.sample_rate),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.inner.options)
            .field("enabled", &self.is_enabled())
            .field("in_flight", &self.inner.in_flight.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberline_core::trace::PropagationContext;
    use emberline_core::user::User;
    use emberline_transports::MemoryTransport;
    use std::sync::atomic::AtomicUsize;

    fn client_with(transport: Arc<MemoryTransport>) -> Client {
        Client::new(ClientOptions::new().with_transport(transport))
    }

    #[tokio::test]
    async fn captured_message_carries_bound_scope_context() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());
        client.configure_scope(|scope| {
            scope.set_tag("env", "prod").set_user(Some(User::with_id("1")));
        });

        let id = client.capture_message("hi", Level::Info, None, None).await;
        assert!(id.is_some());
        assert!(client.flush(Some(Duration::from_secs(1))).await);

        let envelopes = transport.envelopes();
        assert_eq!(envelopes.len(), 1);
        let event = envelopes[0].event().unwrap();
        assert_eq!(event.message.as_deref(), Some("hi"));
        assert_eq!(event.tags.get("env").map(String::as_str), Some("prod"));
        assert_eq!(event.user.as_ref().unwrap().id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn explicit_scope_argument_overrides_bound_scope() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());
        client.configure_scope(|scope| {
            scope.set_tag("env", "prod");
        });

        let mut explicit = Scope::new();
        explicit.set_tag("env", "canary");
        client
            .capture_message("hi", Level::Info, None, Some(&explicit))
            .await;
        client.flush(None).await;

        let event = transport.envelopes()[0].event().unwrap().clone();
        assert_eq!(event.tags.get("env").map(String::as_str), Some("canary"));
    }

    #[tokio::test]
    async fn exception_capture_builds_the_chain() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());

        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let id = client
            .capture_exception(ThrownValue::error(err), None, None)
            .await;
        assert!(id.is_some());
        client.flush(None).await;

        let event = transport.envelopes()[0].event().unwrap().clone();
        assert!(event.is_exception());
        assert_eq!(event.exceptions[0].value, "disk on fire");
    }

    #[tokio::test]
    async fn processor_drop_returns_none_and_counts() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());
        let after_send = Arc::new(AtomicUsize::new(0));
        {
            let after_send = after_send.clone();
            client.on(HookKind::AfterSendEvent, move |_| {
                after_send.fetch_add(1, Ordering::SeqCst);
            });
        }
        client.configure_scope(|scope| {
            scope.add_event_processor(|_, _| None);
        });

        let id = client
            .capture_exception(ThrownValue::error(std::fmt::Error), None, None)
            .await;
        assert!(id.is_none());
        assert_eq!(
            client.dropped_event_count(DropReason::EventProcessor, DataCategory::Error),
            1
        );

        client.flush(None).await;
        assert!(transport.is_empty());
        assert_eq!(after_send.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn before_send_rejection_counts() {
        let transport = Arc::new(MemoryTransport::new());
        let client = Client::new(
            ClientOptions::new()
                .with_transport(transport.clone())
                .with_before_send(|_| None),
        );

        let id = client.capture_message("hi", Level::Info, None, None).await;
        assert!(id.is_none());
        assert_eq!(
            client.dropped_event_count(DropReason::BeforeSend, DataCategory::Error),
            1
        );
        client.flush(None).await;
        assert!(transport.is_empty());
    }

    #[tokio::test]
    async fn zero_sample_rate_drops_everything() {
        let transport = Arc::new(MemoryTransport::new());
        let client = Client::new(
            ClientOptions::new()
                .with_transport(transport.clone())
                .with_sample_rate(0.0),
        );

        let id = client.capture_message("hi", Level::Info, None, None).await;
        assert!(id.is_none());
        assert_eq!(
            client.dropped_event_count(DropReason::SampleRate, DataCategory::Error),
            1
        );
    }

    #[tokio::test]
    async fn close_disables_further_captures() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());

        assert!(client.close(Some(Duration::ZERO)).await);
        assert!(!client.is_enabled());

        let id = client.capture_message("late", Level::Info, None, None).await;
        assert!(id.is_none());
        client.flush(None).await;
        assert!(transport.is_empty());

        // bookkeeping still works while disabled
        client.record_dropped_event(DropReason::NetworkError, DataCategory::Error, None);
        assert_eq!(
            client.dropped_event_count(DropReason::NetworkError, DataCategory::Error),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn flush_times_out_but_slow_send_still_completes() {
        let transport =
            Arc::new(MemoryTransport::new().with_delay(Duration::from_millis(1000)));
        let client = client_with(transport.clone());
        let after_send = Arc::new(AtomicUsize::new(0));
        {
            let after_send = after_send.clone();
            client.on(HookKind::AfterSendEvent, move |_| {
                after_send.fetch_add(1, Ordering::SeqCst);
            });
        }

        let id = client.capture_message("slow", Level::Info, None, None).await;
        assert!(id.is_some());

        // the 10ms window elapses while the send still sleeps
        assert!(!client.flush(Some(Duration::from_millis(10))).await);
        assert_eq!(after_send.load(Ordering::SeqCst), 0);

        // the send keeps running and eventually lands
        assert!(client.flush(None).await);
        assert_eq!(transport.len(), 1);
        assert_eq!(after_send.load(Ordering::SeqCst), 1);

        // flush does not disable the client
        assert!(client.is_enabled());
    }

    #[tokio::test]
    async fn after_send_event_carries_the_response() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = seen.clone();
            client.on(HookKind::AfterSendEvent, move |event| {
                if let HookEvent::AfterSendEvent { response, .. } = event {
                    *seen.lock().unwrap() = *response;
                }
            });
        }

        client.capture_message("hi", Level::Info, None, None).await;
        client.flush(None).await;
        assert_eq!(seen.lock().unwrap().unwrap().status_code, Some(200));
    }

    #[tokio::test]
    async fn failed_send_reports_absent_response() {
        let transport = Arc::new(
            MemoryTransport::new().fail_with(TransportError::SendFailed("refused".into())),
        );
        let client = client_with(transport.clone());
        let responses = Arc::new(Mutex::new(Vec::new()));
        {
            let responses = responses.clone();
            client.on(HookKind::AfterSendEvent, move |event| {
                if let HookEvent::AfterSendEvent { response, .. } = event {
                    responses.lock().unwrap().push(*response);
                }
            });
        }

        client.capture_message("hi", Level::Info, None, None).await;
        client.flush(None).await;

        assert_eq!(*responses.lock().unwrap(), vec![None]);
        assert_eq!(
            client.dropped_event_count(DropReason::NetworkError, DataCategory::Error),
            1
        );
    }

    #[tokio::test]
    async fn rate_limit_backs_off_locally() {
        let transport = Arc::new(
            MemoryTransport::new()
                .fail_with(TransportError::RateLimited { retry_after_secs: 60 }),
        );
        let client = client_with(transport.clone());

        client.capture_message("first", Level::Info, None, None).await;
        client.flush(None).await;
        assert_eq!(transport.attempts(), 1);

        // the second event never reaches the transport
        client.capture_message("second", Level::Info, None, None).await;
        client.flush(None).await;
        assert_eq!(transport.attempts(), 1);
        assert_eq!(
            client.dropped_event_count(DropReason::RatelimitBackoff, DataCategory::Error),
            2
        );
    }

    #[tokio::test]
    async fn before_envelope_sees_the_envelope() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());
        let items = Arc::new(AtomicUsize::new(0));
        {
            let items = items.clone();
            client.on(HookKind::BeforeEnvelope, move |event| {
                if let HookEvent::BeforeEnvelope(envelope) = event {
                    items.store(envelope.items.len(), Ordering::SeqCst);
                }
            });
        }

        let mut scope = Scope::new();
        scope.add_attachment(emberline_core::attachment::Attachment::new(
            "log.txt",
            vec![1, 2],
        ));
        client
            .capture_message("hi", Level::Info, None, Some(&scope))
            .await;
        client.flush(None).await;
        assert_eq!(items.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn propagation_context_becomes_a_trace_header() {
        let transport = Arc::new(MemoryTransport::new());
        let client = Client::new(
            ClientOptions::new()
                .with_transport(transport.clone())
                .with_dsn("https://key@host/1".parse().unwrap()),
        );
        let dsc_seen = Arc::new(AtomicUsize::new(0));
        {
            let dsc_seen = dsc_seen.clone();
            client.on(HookKind::CreateDsc, move |_| {
                dsc_seen.fetch_add(1, Ordering::SeqCst);
            });
        }
        client.configure_scope(|scope| {
            scope.set_propagation_context(PropagationContext::new());
        });

        client.capture_message("hi", Level::Info, None, None).await;
        client.flush(None).await;

        let envelope = transport.envelopes().pop().unwrap();
        let trace = envelope.trace.unwrap();
        assert_eq!(trace.public_key.as_deref(), Some("key"));
        assert_eq!(dsc_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sessions_forward_without_scope_merge() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());
        client.configure_scope(|scope| {
            scope.set_tag("env", "prod");
        });

        client.capture_session(Session::start());
        client.flush(None).await;

        let envelopes = transport.envelopes();
        assert_eq!(envelopes.len(), 1);
        assert!(envelopes[0].event().is_none());
        assert!(matches!(envelopes[0].items[0], EnvelopeItem::Session(_)));
    }

    #[tokio::test]
    async fn check_in_returns_its_id_synchronously() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());

        let check_in = CheckIn::new("nightly", emberline_core::checkin::CheckInStatus::Ok);
        let expected = check_in.check_in_id;
        let id = client.capture_check_in(check_in, None);
        assert_eq!(id, expected);

        client.flush(None).await;
        assert_eq!(transport.len(), 1);
    }

    #[tokio::test]
    async fn close_ships_a_client_report() {
        let transport = Arc::new(MemoryTransport::new());
        let client = Client::new(
            ClientOptions::new()
                .with_transport(transport.clone())
                .with_before_send(|_| None),
        );

        client.capture_message("dropped", Level::Info, None, None).await;
        assert!(client.close(None).await);

        let envelopes = transport.envelopes();
        assert_eq!(envelopes.len(), 1);
        match &envelopes[0].items[0] {
            EnvelopeItem::ClientReport(report) => {
                assert_eq!(report.discarded_events.len(), 1);
                assert_eq!(report.discarded_events[0].reason, DropReason::BeforeSend);
            }
            other => panic!("expected client report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_accessor_is_lazy() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());
        assert!(client.transport().is_none());

        client.capture_message("hi", Level::Info, None, None).await;
        client.flush(None).await;
        assert!(client.transport().is_some());
    }

    #[tokio::test]
    async fn captures_without_transport_count_as_internal_drops() {
        let client = Client::new(ClientOptions::default());
        let id = client.capture_message("hi", Level::Info, None, None).await;
        // processing succeeded, delivery had nowhere to go
        assert!(id.is_some());
        client.flush(None).await;
        assert_eq!(
            client.dropped_event_count(DropReason::Internal, DataCategory::Error),
            1
        );
    }

    #[tokio::test]
    async fn duplicate_integration_names_set_up_once() {
        struct CountingIntegration(Arc<AtomicUsize>);

        impl crate::integration::Integration for CountingIntegration {
            fn name(&self) -> &str {
                "counting"
            }

            fn setup_once(&self, _client: &Client) -> emberline_core::Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let client = Client::new(ClientOptions::default());
        let setups = Arc::new(AtomicUsize::new(0));
        client.add_integration(Arc::new(CountingIntegration(setups.clone())));
        client.add_integration(Arc::new(CountingIntegration(setups.clone())));

        client.setup_integrations();
        client.setup_integrations();
        assert_eq!(setups.load(Ordering::SeqCst), 1);
        assert!(client.integration("counting").is_some());
    }

    #[tokio::test]
    async fn options_can_start_the_client_disabled() {
        let transport = Arc::new(MemoryTransport::new());
        let client = Client::new(
            ClientOptions::new()
                .with_transport(transport.clone())
                .with_enabled(false),
        );

        assert!(!client.is_enabled());
        let id = client.capture_message("hi", Level::Info, None, None).await;
        assert!(id.is_none());
        client.flush(None).await;
        assert!(transport.is_empty());
    }

    #[tokio::test]
    async fn send_event_bypasses_processing() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());
        client.configure_scope(|scope| {
            scope.add_event_processor(|_, _| None);
        });

        client.send_event(Event::from_message("direct", Level::Info));
        client.flush(None).await;

        assert_eq!(transport.len(), 1);
    }

    #[tokio::test]
    async fn hint_event_id_is_kept() {
        let transport = Arc::new(MemoryTransport::new());
        let client = client_with(transport.clone());

        let pinned = EventId::new();
        let hint = EventHint {
            event_id: Some(pinned),
            ..Default::default()
        };
        let id = client
            .capture_message("hi", Level::Info, Some(hint), None)
            .await;
        assert_eq!(id, Some(pinned));

        client.flush(None).await;
        assert_eq!(transport.envelopes()[0].event().unwrap().event_id, pinned);
    }
}
