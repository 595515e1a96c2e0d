//! Testbed event bus.
//!
//! Provides the in-process publish/subscribe hub for registry lifecycle
//! events:
//!
//! - [`EventBus`] — fan-out hub backed by `tokio::sync::broadcast`.
//! - [`ResourceEvent`] — the canonical event envelope.

pub mod bus;

pub use bus::{EventBus, ResourceEvent};
