//! Signalling engine trait and notification types
//!
//! An engine owns the transport to the conferencing deployment: it
//! establishes connections, joins rooms, transmits session-accept envelopes,
//! and resolves participants. Handles it returns are opaque tokens; the
//! guards in this module make sure each handle is released exactly once even
//! on error paths.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::signaling::registry::NotificationSink;
use crate::Result;

/// Opaque engine handle for an established signalling connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineConnection(
    /// Engine-assigned identifier
    pub u64,
);

/// Opaque engine handle for a joined conference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineConference(
    /// Engine-assigned identifier
    pub u64,
);

/// Remote participant details as reported by the signalling engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    /// Full signalling address of the participant
    pub jid: String,
    /// Display name, if the participant advertised one
    pub nick: Option<String>,
    /// Conference-scoped endpoint identifier
    pub endpoint_id: String,
}

/// Asynchronous notification delivered by the engine for a joined conference
#[derive(Debug, Clone)]
pub enum SignallingNotification {
    /// A remote participant entered the room
    ParticipantJoined(ParticipantInfo),
    /// A remote participant left the room
    ParticipantLeft(ParticipantInfo),
    /// The focus sent a session offer (initial or renegotiation)
    OfferReceived {
        /// Remote session description in SDP form
        sdp: String,
        /// Whether the focus expects an answer transmitted back
        should_send_answer: bool,
    },
    /// The focus terminated the media session
    SessionTerminate,
}

/// Transport-agnostic signalling engine
///
/// Implementations must be safe to call from any thread. Notification
/// delivery happens through the [`NotificationSink`] passed to
/// [`join`](SignallingEngine::join) and may also come from any thread; the
/// sink takes care of marshalling onto the dispatcher.
#[async_trait]
pub trait SignallingEngine: Send + Sync + 'static {
    /// Initialize engine-global state
    ///
    /// Called once per [`SignallingContext`](crate::SignallingContext).
    ///
    /// # Errors
    ///
    /// Fails if the engine cannot allocate its runtime state.
    async fn start(&self) -> Result<()>;

    /// Tear down engine-global state
    ///
    /// Must be infallible; called from `Drop`.
    fn shutdown(&self);

    /// Establish an authenticated connection to the deployment
    ///
    /// # Errors
    ///
    /// Fails when the transport cannot be established or authentication is
    /// rejected. No handle is allocated on failure.
    async fn connect(&self, url: &str, domain: &str, tls_insecure: bool)
        -> Result<EngineConnection>;

    /// Release a connection handle
    fn release_connection(&self, conn: EngineConnection);

    /// Join a room over an established connection
    ///
    /// On success the engine delivers room notifications through `sink` until
    /// the conference handle is released.
    ///
    /// # Errors
    ///
    /// Fails when the room cannot be entered. The engine must not retain
    /// `sink` on failure.
    async fn join(
        &self,
        conn: EngineConnection,
        room: &str,
        nick: &str,
        sink: NotificationSink,
    ) -> Result<EngineConference>;

    /// Transmit a session-accept carrying the local answer SDP
    ///
    /// # Errors
    ///
    /// Fails when the envelope cannot be transmitted.
    async fn accept(&self, conf: EngineConference, sdp: &str) -> Result<()>;

    /// Resolve a participant by conference-scoped endpoint identifier
    ///
    /// Returns `Ok(None)` when no such participant is currently in the room.
    ///
    /// # Errors
    ///
    /// Fails only on engine faults, never on a simple miss.
    async fn participant(
        &self,
        conf: EngineConference,
        endpoint_id: &str,
    ) -> Result<Option<ParticipantInfo>>;

    /// Return the local participant's conference-scoped endpoint identifier
    ///
    /// # Errors
    ///
    /// Fails if the conference handle is no longer valid.
    async fn local_endpoint_id(&self, conf: EngineConference) -> Result<String>;

    /// Release a conference handle, leaving the room
    fn release_conference(&self, conf: EngineConference);
}

/// Releases an [`EngineConnection`] exactly once
pub struct ConnectionGuard {
    engine: Arc<dyn SignallingEngine>,
    handle: Option<EngineConnection>,
}

impl ConnectionGuard {
    /// Take ownership of a connection handle
    pub fn new(engine: Arc<dyn SignallingEngine>, handle: EngineConnection) -> Self {
        Self {
            engine,
            handle: Some(handle),
        }
    }

    /// The guarded handle, if not yet released
    pub fn handle(&self) -> Option<EngineConnection> {
        self.handle
    }

    /// Release the handle now instead of at drop
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.release_connection(handle);
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Releases an [`EngineConference`] exactly once
pub struct ConferenceGuard {
    engine: Arc<dyn SignallingEngine>,
    handle: Option<EngineConference>,
}

impl ConferenceGuard {
    /// Take ownership of a conference handle
    pub fn new(engine: Arc<dyn SignallingEngine>, handle: EngineConference) -> Self {
        Self {
            engine,
            handle: Some(handle),
        }
    }

    /// The guarded handle, if not yet released
    pub fn handle(&self) -> Option<EngineConference> {
        self.handle
    }

    /// Release the handle now instead of at drop
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.release_conference(handle);
        }
    }
}

impl Drop for ConferenceGuard {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("Conference handle dropped without explicit leave");
        }
        self.release();
    }
}

impl fmt::Debug for ConferenceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConferenceGuard")
            .field("handle", &self.handle)
            .finish()
    }
}
