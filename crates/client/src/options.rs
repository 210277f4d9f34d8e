//! Client configuration.
//!
//! Options are immutable once the client is constructed. They are built in
//! code with chainable `with_*` setters; `from_env` layers environment
//! overrides on top, so deployments can redirect a binary without a
//! rebuild.

use std::sync::Arc;
use std::time::Duration;

use emberline_core::builder::EventBuilder;
use emberline_core::dsn::Dsn;
use emberline_core::error::Error;
use emberline_core::event::Event;
use emberline_core::transport::Transport;

/// Callback applied to every event after processing; `None` discards.
pub type BeforeSend = Arc<dyn Fn(Event) -> Option<Event> + Send + Sync>;

/// Builds the transport on first use, once the client actually sends.
pub type TransportFactory = Arc<dyn Fn(&ClientOptions) -> Arc<dyn Transport> + Send + Sync>;

/// Name and version the SDK reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkMetadata {
    pub name: String,
    pub version: String,
}

impl Default for SdkMetadata {
    fn default() -> Self {
        Self {
            name: "emberline.rust".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Immutable configuration for a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientOptions {
    /// Project endpoint descriptor; feeds trace headers and accessors
    pub dsn: Option<Dsn>,

    /// Start the client enabled; a disabled client no-ops every capture
    pub enabled: bool,

    /// Deployment environment stamped on outgoing events
    pub environment: Option<String>,

    /// Release identifier stamped on outgoing events
    pub release: Option<String>,

    /// Cap on merged breadcrumb trails
    pub max_breadcrumbs: usize,

    /// Fraction of error events to keep; 1.0 keeps everything
    pub sample_rate: f32,

    /// Default drain bound used by [`Client::shutdown`](crate::Client::shutdown)
    pub shutdown_timeout: Duration,

    pub sdk_metadata: SdkMetadata,

    /// Final gate before delivery
    pub before_send: Option<BeforeSend>,

    /// Delivery channel factory, invoked lazily on first send
    pub transport: Option<TransportFactory>,

    /// Event-construction collaborator; a basic builder is used when unset
    pub event_builder: Option<Arc<dyn EventBuilder>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dsn: None,
            enabled: true,
            environment: None,
            release: None,
            max_breadcrumbs: 100,
            sample_rate: 1.0,
            shutdown_timeout: Duration::from_secs(2),
            sdk_metadata: SdkMetadata::default(),
            before_send: None,
            transport: None,
            event_builder: None,
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dsn(mut self, dsn: Dsn) -> Self {
        self.dsn = Some(dsn);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn with_max_breadcrumbs(mut self, max: usize) -> Self {
        self.max_breadcrumbs = max;
        self
    }

    /// Clamped to `0.0..=1.0`.
    pub fn with_sample_rate(mut self, rate: f32) -> Self {
        self.sample_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_before_send(
        mut self,
        callback: impl Fn(Event) -> Option<Event> + Send + Sync + 'static,
    ) -> Self {
        self.before_send = Some(Arc::new(callback));
        self
    }

    /// Use an already-constructed transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(Arc::new(move |_| transport.clone()));
        self
    }

    /// Build the transport lazily from the final options.
    pub fn with_transport_factory(
        mut self,
        factory: impl Fn(&ClientOptions) -> Arc<dyn Transport> + Send + Sync + 'static,
    ) -> Self {
        self.transport = Some(Arc::new(factory));
        self
    }

    pub fn with_event_builder(mut self, builder: Arc<dyn EventBuilder>) -> Self {
        self.event_builder = Some(builder);
        self
    }

    /// Apply `EMBERLINE_DSN`, `EMBERLINE_ENVIRONMENT`, and
    /// `EMBERLINE_RELEASE` overrides from the process environment.
    pub fn from_env(self) -> Result<Self, Error> {
        self.from_env_lookup(|key| std::env::var(key).ok())
    }

    fn from_env_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        if let Some(raw) = lookup("EMBERLINE_DSN") {
            self.dsn = Some(raw.parse::<Dsn>().map_err(Error::from)?);
        }
        if let Some(environment) = lookup("EMBERLINE_ENVIRONMENT") {
            self.environment = Some(environment);
        }
        if let Some(release) = lookup("EMBERLINE_RELEASE") {
            self.release = Some(release);
        }
        Ok(self)
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("dsn", &self.dsn)
            .field("enabled", &self.enabled)
            .field("environment", &self.environment)
            .field("release", &self.release)
            .field("max_breadcrumbs", &self.max_breadcrumbs)
            .field("sample_rate", &self.sample_rate)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("sdk_metadata", &self.sdk_metadata)
            .field("before_send", &self.before_send.is_some())
            .field("transport", &self.transport.is_some())
            .field("event_builder", &self.event_builder.is_some())
            .finish()
    }
}
