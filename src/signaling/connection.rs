//! An established signalling connection

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::conference::Conference;
use crate::delegate::ConferenceDelegate;
use crate::dispatch::OperationQueue;
use crate::peer::session::{LocalTrack, MediaSessionFactory};
use crate::signaling::engine::{ConnectionGuard, SignallingEngine};
use crate::signaling::registry::AgentRegistry;
use crate::{Error, Result};

/// An authenticated connection to a conferencing deployment
///
/// Rooms are joined through [`join`](Connection::join); the underlying
/// engine handle is released when the `Connection` drops.
pub struct Connection {
    engine: Arc<dyn SignallingEngine>,
    registry: Arc<AgentRegistry>,
    queue: OperationQueue,
    factory: Arc<dyn MediaSessionFactory>,
    guard: ConnectionGuard,
    id: Uuid,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Connection {
    pub(crate) async fn establish(
        engine: Arc<dyn SignallingEngine>,
        registry: Arc<AgentRegistry>,
        queue: OperationQueue,
        factory: Arc<dyn MediaSessionFactory>,
        url: &str,
        domain: &str,
        tls_insecure: bool,
    ) -> Result<Self> {
        let handle = engine
            .connect(url, domain, tls_insecure)
            .await
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;

        let id = Uuid::new_v4();
        info!(connection_id = %id, url, "Signalling connection established");
        Ok(Self {
            guard: ConnectionGuard::new(Arc::clone(&engine), handle),
            engine,
            registry,
            queue,
            factory,
            id,
        })
    }

    /// Local identifier of this connection
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Join a room, attaching `local_tracks` to the media session
    ///
    /// Conference events are delivered to `delegate` on the dispatcher. The
    /// delegate is held weakly; the application keeps it alive for the
    /// lifetime of the conference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JoinFailed`] when the room cannot be entered; the
    /// connection remains usable and the join can be retried.
    pub async fn join(
        &self,
        room: &str,
        nick: &str,
        local_tracks: Vec<LocalTrack>,
        delegate: Arc<dyn ConferenceDelegate>,
    ) -> Result<Conference> {
        let handle = self.guard.handle().ok_or(Error::Terminated)?;
        Conference::join(
            Arc::clone(&self.engine),
            Arc::clone(&self.registry),
            self.queue.clone(),
            Arc::clone(&self.factory),
            handle,
            room,
            nick,
            local_tracks,
            delegate,
        )
        .await
    }
}
