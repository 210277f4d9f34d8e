//! Transport trait — the abstraction over delivery channels.
//!
//! A Transport accepts a finished [`Envelope`] and asynchronously reports a
//! delivery outcome. Wire concerns (HTTP, batching, retries) live entirely
//! inside implementations; the client only observes success, failure, or a
//! rate-limit signal.

use async_trait::async_trait;

use crate::envelope::Envelope;
use crate::error::TransportError;

/// Outcome of a successful delivery attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// Upstream status code, when the channel has one
    pub status_code: Option<u16>,
}

impl TransportResponse {
    pub fn accepted() -> Self {
        Self {
            status_code: Some(200),
        }
    }
}

/// The delivery channel contract.
///
/// Implementations must be cheap to share (`Send + Sync`); the client calls
/// `send` from spawned tasks and never serializes access.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name (e.g., "http", "memory").
    fn name(&self) -> &str;

    /// Deliver one envelope.
    ///
    /// Errors are reported to drop accounting, never to the capturing
    /// caller. Returning [`TransportError::RateLimited`] asks the client to
    /// back off locally for the given number of seconds.
    async fn send(&self, envelope: Envelope) -> Result<TransportResponse, TransportError>;
}
