//! An in-memory transport that records what it is asked to deliver.
//!
//! This is the test double the rest of the workspace exercises the client
//! against: it stores accepted envelopes behind a lock and can simulate
//! slow channels (`with_delay`) and failing ones (`fail_with`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use emberline_core::envelope::Envelope;
use emberline_core::error::TransportError;
use emberline_core::transport::{Transport, TransportResponse};

/// Records envelopes instead of delivering them.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    envelopes: Mutex<Vec<Envelope>>,
    attempts: AtomicUsize,
    delay: Option<Duration>,
    failure: Mutex<Option<TransportError>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before settling each send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every send with a clone of `error` until cleared.
    pub fn fail_with(self, error: TransportError) -> Self {
        *self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
        self
    }

    /// Stop failing; subsequent sends are recorded again.
    pub fn clear_failure(&self) {
        *self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Envelopes accepted so far, in arrival order.
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.envelopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Accepted envelope count.
    pub fn len(&self) -> usize {
        self.envelopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send attempts seen, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send(&self, envelope: Envelope) -> Result<TransportResponse, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(error) = failure {
            debug!(error = %error, "Memory transport failing by request");
            return Err(error);
        }
        self.envelopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(envelope);
        Ok(TransportResponse::accepted())
    }
}
