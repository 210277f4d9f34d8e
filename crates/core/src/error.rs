//! Error types for the Emberline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Emberline operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Event construction errors ---
    #[error("Event build error: {0}")]
    Build(#[from] BuildError),

    // --- DSN errors ---
    #[error("DSN error: {0}")]
    Dsn(#[from] DsnError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Delivery failed: {0}")]
    SendFailed(String),

    #[error("Rate limited by upstream, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Transport is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Context extraction failed: {0}")]
    ExtractionFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DsnError {
    #[error("Invalid DSN: not a valid URL")]
    InvalidUrl,

    #[error("Invalid DSN: unsupported scheme '{0}'")]
    InvalidScheme(String),

    #[error("Invalid DSN: missing public key")]
    MissingPublicKey,

    #[error("Invalid DSN: missing or invalid project id")]
    MissingProjectId,
}
