//! # Emberline Client
//!
//! Capture orchestration for the Emberline telemetry client: the mutable
//! [`Scope`] context container, the [`Client`] pipeline that merges scope
//! state into events and hands survivors to a transport, plus the typed
//! hook bus and the integration registry.
//!
//! ```no_run
//! use std::sync::Arc;
//! use emberline_client::{Client, ClientOptions};
//! use emberline_core::{Level, User};
//! use emberline_transports::MemoryTransport;
//!
//! # async fn example() {
//! let client = Client::new(
//!     ClientOptions::new()
//!         .with_environment("prod")
//!         .with_transport(Arc::new(MemoryTransport::new())),
//! );
//!
//! client.configure_scope(|scope| {
//!     scope.set_tag("env", "prod").set_user(Some(User::with_id("1")));
//! });
//! client.capture_message("it happened", Level::Warning, None, None).await;
//! client.close(Some(std::time::Duration::from_secs(2))).await;
//! # }
//! ```

pub mod builder;
pub mod client;
mod drain;
pub mod hooks;
pub mod integration;
pub mod options;
pub mod report;
pub mod scope;

// Re-export key types at crate root for ergonomics
pub use builder::BasicEventBuilder;
pub use client::Client;
pub use hooks::{HookBus, HookCallback, HookEvent, HookKind};
pub use integration::{Integration, IntegrationRegistry};
pub use options::{BeforeSend, ClientOptions, SdkMetadata, TransportFactory};
pub use report::DropAccounting;
pub use scope::{EventProcessor, Scope, ScopeContext, ScopeUpdate, DEFAULT_MAX_BREADCRUMBS};
