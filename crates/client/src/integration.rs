//! Integration registry — named extensions with a one-time setup lifecycle.

use std::sync::Arc;

use emberline_core::error::Result;
use tracing::{debug, info, warn};

use crate::client::Client;

/// A named extension installed on a client.
///
/// `setup_once` runs exactly once per client, in registration order, when
/// [`Client::setup_integrations`] is first called.
pub trait Integration: Send + Sync {
    /// Registry key; adding a second integration with the same name is a
    /// no-op.
    fn name(&self) -> &str;

    /// One-time setup. A failure is logged and isolated; it does not stop
    /// the remaining integrations from being set up.
    fn setup_once(&self, client: &Client) -> Result<()>;
}

/// Insertion-ordered, name-keyed collection of integrations.
#[derive(Default)]
pub struct IntegrationRegistry {
    integrations: Vec<Arc<dyn Integration>>,
    installed: bool,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an integration; duplicates by name are ignored.
    ///
    /// Returns whether the integration was actually added.
    pub fn add(&mut self, integration: Arc<dyn Integration>) -> bool {
        let name = integration.name();
        if self.integrations.iter().any(|i| i.name() == name) {
            debug!(integration = %name, "Integration already registered, skipping");
            return false;
        }
        info!(integration = %name, "Registered integration");
        self.integrations.push(integration);
        true
    }

    /// Look up an integration by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Integration>> {
        self.integrations.iter().find(|i| i.name() == name)
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    /// Mark the registry installed and hand out the integrations to set
    /// up. Returns `None` on every call after the first.
    ///
    /// The caller runs `setup_once` outside any lock around the registry;
    /// setup callbacks receive the client and may register further
    /// integrations.
    pub fn take_pending_setup(&mut self) -> Option<Vec<Arc<dyn Integration>>> {
        if self.installed {
            return None;
        }
        self.installed = true;
        Some(self.integrations.clone())
    }

    /// Run every integration's `setup_once` in registration order.
    ///
    /// Only the first call does anything; later calls are no-ops even if
    /// integrations were added in between.
    pub fn setup_all(&mut self, client: &Client) {
        let Some(integrations) = self.take_pending_setup() else {
            return;
        };
        for integration in integrations {
            if let Err(e) = integration.setup_once(client) {
                warn!(integration = %integration.name(), error = %e, "Integration setup failed");
            }
        }
    }
}

impl std::fmt::Debug for IntegrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.integrations.iter().map(|i| i.name()).collect();
        f.debug_struct("IntegrationRegistry")
            .field("integrations", &names)
            .field("installed", &self.installed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ClientOptions;
    use emberline_core::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingIntegration {
        name: String,
        setups: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingIntegration {
        fn new(name: &str, setups: Arc<AtomicUsize>) -> Self {
            Self {
                name: name.into(),
                setups,
                fail: false,
            }
        }

        fn failing(name: &str, setups: Arc<AtomicUsize>) -> Self {
            Self {
                name: name.into(),
                setups,
                fail: true,
            }
        }
    }

    impl Integration for CountingIntegration {
        fn name(&self) -> &str {
            &self.name
        }

        fn setup_once(&self, _client: &Client) -> Result<()> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Internal("setup exploded".into()));
            }
            Ok(())
        }
    }

    fn test_client() -> Client {
        Client::new(ClientOptions::default())
    }

    #[test]
    fn duplicate_names_are_ignored() {
        let setups = Arc::new(AtomicUsize::new(0));
        let mut registry = IntegrationRegistry::new();
        assert!(registry.add(Arc::new(CountingIntegration::new("ctx", setups.clone()))));
        assert!(!registry.add(Arc::new(CountingIntegration::new("ctx", setups.clone()))));
        assert_eq!(registry.len(), 1);

        registry.setup_all(&test_client());
        assert_eq!(setups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn setup_all_runs_once() {
        let setups = Arc::new(AtomicUsize::new(0));
        let mut registry = IntegrationRegistry::new();
        registry.add(Arc::new(CountingIntegration::new("ctx", setups.clone())));

        let client = test_client();
        registry.setup_all(&client);
        registry.setup_all(&client);
        assert_eq!(setups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_setup_is_isolated() {
        let failing = Arc::new(AtomicUsize::new(0));
        let healthy = Arc::new(AtomicUsize::new(0));
        let mut registry = IntegrationRegistry::new();
        registry.add(Arc::new(CountingIntegration::failing("bad", failing.clone())));
        registry.add(Arc::new(CountingIntegration::new("good", healthy.clone())));

        registry.setup_all(&test_client());
        assert_eq!(failing.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lookup_by_name() {
        let setups = Arc::new(AtomicUsize::new(0));
        let mut registry = IntegrationRegistry::new();
        registry.add(Arc::new(CountingIntegration::new("ctx", setups)));
        assert!(registry.get("ctx").is_some());
        assert!(registry.get("missing").is_none());
    }
}
