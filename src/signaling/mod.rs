//! Signalling layer: engine abstraction, context, and connections
//!
//! The signalling engine (XMPP over WebSocket in a typical deployment) lives
//! behind the [`SignallingEngine`] trait so the orchestration layer never
//! depends on a concrete stack. Notifications cross back into the crate
//! through a generation-checked [`NotificationSink`](crate::NotificationSink)
//! so late callbacks from a torn-down conference are rejected instead of
//! reaching freed state.

pub mod connection;
pub mod context;
pub mod engine;
pub mod registry;

pub use connection::Connection;
pub use context::SignallingContext;
