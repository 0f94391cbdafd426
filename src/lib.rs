//! Client-side session orchestration for multipoint WebRTC conferences
//!
//! This crate owns the lifecycle of a signalling connection, negotiates one
//! WebRTC media session per conference, and reconciles asynchronous
//! notifications arriving from foreign threads (signalling engine, media
//! engine) into a locally consistent, ordered stream of application events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  SignallingContext                                       │
//! │  ├─ SignallingEngine (trait: connect/join/accept/lookup) │
//! │  ├─ AgentRegistry (generation-checked callback tokens)   │
//! │  └─ OperationQueue ──► Dispatcher (single consumer)      │
//! │       ▲                     │                            │
//! │  Connection                 ▼                            │
//! │  └─ Conference         ConferenceDelegate hooks          │
//! │      ├─ MediaSession (trait, rebuilt on terminate)       │
//! │      ├─ negotiation state machine (offer → answer)       │
//! │      └─ participant lookup (endpoint id → Participant)   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Signalling and media notifications may arrive on arbitrary threads; they
//! are only ever *enqueued* onto the operation queue. All conference state
//! mutation and every delegate invocation happen on the single dispatch
//! context, so application code never observes a data race on session state.
//!
//! # Example
//!
//! ```ignore
//! use roomlink::{RoomlinkConfig, RtcMediaSessionFactory, SignallingContext};
//!
//! let config = RoomlinkConfig {
//!     signalling_url: "wss://meet.example.com/xmpp-websocket".into(),
//!     xmpp_domain: "meet.example.com".into(),
//!     ..Default::default()
//! };
//!
//! let factory = Arc::new(RtcMediaSessionFactory::new(config.clone()));
//! let (context, dispatcher) = SignallingContext::create(engine, factory, config).await?;
//! tokio::spawn(dispatcher.run());
//!
//! let connection = context.connect().await?;
//! let conference = connection
//!     .join("orchard", "alice", local_tracks, delegate)
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conference;
pub mod config;
pub mod delegate;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod peer;
pub mod signaling;

// Re-exports for public API
pub use conference::{Conference, NegotiationPhase, Participant};
pub use config::RoomlinkConfig;
pub use delegate::ConferenceDelegate;
pub use dispatch::{Dispatcher, OperationQueue};
pub use error::{Error, Result};
pub use peer::engine::RtcMediaSessionFactory;
pub use peer::session::{
    LocalTrack, MediaConnectionState, MediaEvent, MediaObserver, MediaSession,
    MediaSessionFactory, RemoteTrack, TrackKind, VideoFrame,
};
pub use signaling::engine::{
    EngineConference, EngineConnection, ParticipantInfo, SignallingEngine, SignallingNotification,
};
pub use signaling::registry::{AgentRegistry, AgentToken, NotificationSink};
pub use signaling::{Connection, SignallingContext};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
