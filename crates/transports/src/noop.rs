//! A transport that accepts everything and delivers nothing.

use async_trait::async_trait;
use tracing::debug;

use emberline_core::envelope::Envelope;
use emberline_core::error::TransportError;
use emberline_core::transport::{Transport, TransportResponse};

/// Discards every envelope, always reporting success.
///
/// Useful for wiring a client in environments where delivery is disabled
/// and for benchmarks that should not measure a channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    fn name(&self) -> &str {
        "noop"
    }

    async fn send(&self, envelope: Envelope) -> Result<TransportResponse, TransportError> {
        debug!(items = envelope.items.len(), "Envelope discarded by noop transport");
        Ok(TransportResponse::accepted())
    }
}
