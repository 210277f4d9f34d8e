//! # Emberline Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! Emberline telemetry client. This crate has **zero orchestration logic** —
//! it defines the domain model that the client and transport crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping delivery channels and event builders via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod attachment;
pub mod breadcrumb;
pub mod builder;
pub mod checkin;
pub mod dsn;
pub mod envelope;
pub mod error;
pub mod event;
pub mod report;
pub mod session;
pub mod trace;
pub mod transport;
pub mod user;

// Re-export key types at crate root for ergonomics
pub use attachment::Attachment;
pub use breadcrumb::{Breadcrumb, BreadcrumbHint};
pub use builder::{EventBuilder, ThrownValue};
pub use checkin::{CheckIn, CheckInStatus, MonitorConfig, MonitorSchedule};
pub use dsn::Dsn;
pub use envelope::{Envelope, EnvelopeItem};
pub use error::{BuildError, DsnError, Error, Result, TransportError};
pub use event::{Event, EventHint, EventId, ExceptionValue, Level};
pub use report::{ClientReport, DataCategory, DiscardedEvent, DropReason};
pub use session::{RequestSession, RequestSessionStatus, Session, SessionStatus};
pub use trace::{DynamicSamplingContext, PropagationContext, SpanRecord};
pub use transport::{Transport, TransportResponse};
pub use user::User;
