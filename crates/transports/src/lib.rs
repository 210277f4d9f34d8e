//! # Emberline Transports
//!
//! In-process implementations of the [`Transport`] delivery contract:
//! [`NoopTransport`] discards everything, [`MemoryTransport`] records
//! envelopes for inspection and can simulate slow or failing channels.
//! The HTTP wire transport is a separate concern and lives outside this
//! workspace.

pub mod memory;
pub mod noop;

pub use emberline_core::transport::Transport;
pub use memory::MemoryTransport;
pub use noop::NoopTransport;
