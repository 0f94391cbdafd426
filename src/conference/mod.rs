//! Conference lifecycle: join, negotiation, participant resolution, teardown
//!
//! A [`Conference`] owns exactly one media session at a time. Signalling and
//! media notifications arrive on foreign threads, get enqueued as operations,
//! and run serially on the dispatcher; a session terminate closes the current
//! media session and immediately rebuilds a fresh one so the focus can
//! renegotiate without the application re-joining.

pub mod negotiation;
pub mod participant;

pub use negotiation::NegotiationPhase;
pub use participant::Participant;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::conference::negotiation::{run_negotiation, RemoteOffer};
use crate::conference::participant::endpoint_id_from_stream;
use crate::delegate::ConferenceDelegate;
use crate::dispatch::OperationQueue;
use crate::peer::session::{LocalTrack, MediaEvent, MediaSession, MediaSessionFactory, TrackKind};
use crate::signaling::engine::{
    ConferenceGuard, EngineConference, EngineConnection, SignallingEngine, SignallingNotification,
};
use crate::signaling::registry::{AgentRegistry, AgentToken, NotificationSink};
use crate::{Error, Result};

/// A joined conference room
///
/// Obtained from [`Connection::join`](crate::Connection::join). Dropping a
/// `Conference` without calling [`leave`](Conference::leave) releases the
/// room handle but skips the orderly media close.
pub struct Conference {
    inner: Arc<ConferenceInner>,
}

impl std::fmt::Debug for Conference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conference")
            .field("room", &self.inner.room)
            .finish_non_exhaustive()
    }
}

pub(crate) struct ConferenceInner {
    pub(crate) room: String,
    nick: String,
    engine: Arc<dyn SignallingEngine>,
    registry: Arc<AgentRegistry>,
    queue: OperationQueue,
    factory: Arc<dyn MediaSessionFactory>,
    local_tracks: Vec<LocalTrack>,
    delegate: Weak<dyn ConferenceDelegate>,
    guard: Mutex<Option<ConferenceGuard>>,
    token: Mutex<Option<AgentToken>>,
    // Current media session, tagged with the epoch it was built under.
    media: RwLock<Option<(Arc<dyn MediaSession>, u64)>>,
    epoch: AtomicU64,
    phase: Mutex<NegotiationPhase>,
}

impl Conference {
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn join(
        engine: Arc<dyn SignallingEngine>,
        registry: Arc<AgentRegistry>,
        queue: OperationQueue,
        factory: Arc<dyn MediaSessionFactory>,
        conn: EngineConnection,
        room: &str,
        nick: &str,
        local_tracks: Vec<LocalTrack>,
        delegate: Arc<dyn ConferenceDelegate>,
    ) -> Result<Self> {
        let inner = Arc::new(ConferenceInner {
            room: room.to_string(),
            nick: nick.to_string(),
            engine: Arc::clone(&engine),
            registry: Arc::clone(&registry),
            queue,
            factory,
            local_tracks,
            delegate: Arc::downgrade(&delegate),
            guard: Mutex::new(None),
            token: Mutex::new(None),
            media: RwLock::new(None),
            epoch: AtomicU64::new(0),
            phase: Mutex::new(NegotiationPhase::Idle),
        });

        // The media session must exist before the engine can deliver the
        // first offer. Its failure is a join failure: nothing has been
        // registered or joined yet.
        let session = ConferenceInner::build_media_session(&inner)
            .await
            .map_err(|e| Error::JoinFailed(e.to_string()))?;
        *inner.media.write() = Some((Arc::clone(&session), inner.current_epoch()));

        let weak = Arc::downgrade(&inner);
        let token = registry.register(Arc::new(move |notification| {
            if let Some(inner) = weak.upgrade() {
                inner.on_signalling(notification);
            }
        }));
        *inner.token.lock() = Some(token);

        let sink = NotificationSink::new(Arc::clone(&registry), token);
        match engine.join(conn, room, nick, sink).await {
            Ok(handle) => {
                *inner.guard.lock() = Some(ConferenceGuard::new(engine, handle));
                info!(room, nick, "Joined conference");
                Ok(Self { inner })
            }
            Err(e) => {
                registry.unregister(token);
                *inner.token.lock() = None;
                inner.media.write().take();
                session.close().await;
                warn!(room, "Failed to join conference: {e}");
                Err(Error::JoinFailed(e.to_string()))
            }
        }
    }

    /// Room name this conference was joined with
    pub fn room(&self) -> &str {
        &self.inner.room
    }

    /// Local display name this conference was joined with
    pub fn nick(&self) -> &str {
        &self.inner.nick
    }

    /// Current position in the negotiation sequence
    pub fn negotiation_phase(&self) -> NegotiationPhase {
        *self.inner.phase.lock()
    }

    /// Conference-scoped endpoint identifier of the local participant
    ///
    /// # Errors
    ///
    /// Returns [`Error::Terminated`] after [`leave`](Conference::leave), or
    /// any engine fault.
    pub async fn local_endpoint_id(&self) -> Result<String> {
        let handle = self.inner.conference_handle().ok_or(Error::Terminated)?;
        self.inner.engine.local_endpoint_id(handle).await
    }

    /// Resolve a remote participant by endpoint identifier
    ///
    /// A participant that is simply not present yields `Ok(None)`; only
    /// engine faults and a left conference produce errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Terminated`] after [`leave`](Conference::leave), or
    /// any engine fault.
    pub async fn lookup_participant(&self, endpoint_id: &str) -> Result<Option<Participant>> {
        let handle = self.inner.conference_handle().ok_or(Error::Terminated)?;
        let info = self.inner.engine.participant(handle, endpoint_id).await?;
        Ok(info.map(Participant::from))
    }

    /// Leave the room and release all associated resources
    ///
    /// Invalidates the notification token first so a late engine callback
    /// cannot observe partially torn-down state. Idempotent.
    pub async fn leave(&self) {
        let token = self.inner.token.lock().take();
        if let Some(token) = token {
            self.inner.registry.unregister(token);
        }

        let guard = self.inner.guard.lock().take();
        if let Some(mut guard) = guard {
            guard.release();
        }

        let media = self.inner.media.write().take();
        if let Some((session, _)) = media {
            session.close().await;
        }

        info!(room = %self.inner.room, "Left conference");
    }
}

impl ConferenceInner {
    pub(crate) fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub(crate) fn set_phase(&self, phase: NegotiationPhase) {
        *self.phase.lock() = phase;
    }

    fn conference_handle(&self) -> Option<EngineConference> {
        self.guard.lock().as_ref().and_then(|g| g.handle())
    }

    fn delegate(&self) -> Option<Arc<dyn ConferenceDelegate>> {
        self.delegate.upgrade()
    }

    /// Transmit the session-accept for a completed negotiation
    pub(crate) async fn send_accept(&self, sdp: &str) -> Result<()> {
        let handle = self.conference_handle().ok_or(Error::Terminated)?;
        self.engine.accept(handle, sdp).await
    }

    /// Build a media session wired to this conference, with the local tracks
    /// attached
    async fn build_media_session(inner: &Arc<Self>) -> Result<Arc<dyn MediaSession>> {
        let weak = Arc::downgrade(inner);
        let queue = inner.queue.clone();
        let observer = Arc::new(move |event: MediaEvent| {
            let weak = weak.clone();
            queue.enqueue(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.on_media_event(event).await;
                }
            });
        });

        let session = inner.factory.create(observer).await?;
        for track in &inner.local_tracks {
            if let Err(e) = session.add_track(track).await {
                session.close().await;
                return Err(e);
            }
        }
        Ok(session)
    }

    /// Marshal a signalling notification onto the dispatcher
    ///
    /// Called from engine threads; does nothing but enqueue.
    fn on_signalling(self: Arc<Self>, notification: SignallingNotification) {
        let queue = self.queue.clone();
        match notification {
            SignallingNotification::ParticipantJoined(info) => {
                let inner = self;
                queue.enqueue(async move {
                    debug!(room = %inner.room, jid = %info.jid, "Participant joined");
                    if let Some(delegate) = inner.delegate() {
                        delegate.participant_joined(Participant::from(info)).await;
                    }
                });
            }
            SignallingNotification::ParticipantLeft(info) => {
                let inner = self;
                queue.enqueue(async move {
                    debug!(room = %inner.room, jid = %info.jid, "Participant left");
                    if let Some(delegate) = inner.delegate() {
                        delegate.participant_left(Participant::from(info)).await;
                    }
                });
            }
            SignallingNotification::OfferReceived {
                sdp,
                should_send_answer,
            } => {
                let inner = self;
                queue.enqueue(async move {
                    // Sample the session at run time, not enqueue time: an
                    // offer queued behind a terminate must negotiate against
                    // the rebuilt session.
                    let current = inner.media.read().clone();
                    let current = match current {
                        Some(pair) => Some(pair),
                        None if inner.conference_handle().is_none() => {
                            debug!(room = %inner.room, "Dropping offer: conference left");
                            None
                        }
                        // An earlier rebuild failed; retry it now so one
                        // transient media fault does not strand the
                        // conference.
                        None => match ConferenceInner::build_media_session(&inner).await {
                            Ok(session) => {
                                let epoch = inner.current_epoch();
                                *inner.media.write() = Some((Arc::clone(&session), epoch));
                                debug!(room = %inner.room, epoch, "Media session rebuilt on offer");
                                Some((session, epoch))
                            }
                            Err(e) => {
                                warn!(room = %inner.room, "No media session for offer: {e}");
                                if let Some(delegate) = inner.delegate() {
                                    delegate.negotiation_failed(e).await;
                                }
                                None
                            }
                        },
                    };
                    let Some((media, epoch)) = current else {
                        return;
                    };
                    let offer = RemoteOffer {
                        sdp,
                        should_send_answer,
                    };
                    if let Err(e) = run_negotiation(&inner, media, offer, epoch).await {
                        warn!(room = %inner.room, "Negotiation failed: {e}");
                        if let Some(delegate) = inner.delegate() {
                            delegate.negotiation_failed(e).await;
                        }
                    }
                });
            }
            SignallingNotification::SessionTerminate => {
                let inner = self;
                queue.enqueue(async move {
                    inner.handle_session_terminate().await;
                });
            }
        }
    }

    /// Close the current media session, notify the delegate, and rebuild
    async fn handle_session_terminate(self: Arc<Self>) {
        let old = self.media.write().take();
        let Some((session, _)) = old else {
            debug!(room = %self.room, "Duplicate session terminate ignored");
            return;
        };

        info!(room = %self.room, "Session terminated by focus");
        session.close().await;
        self.set_phase(NegotiationPhase::Idle);

        if let Some(delegate) = self.delegate() {
            delegate.session_terminated().await;
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        match Self::build_media_session(&self).await {
            Ok(session) => {
                *self.media.write() = Some((session, epoch));
                debug!(room = %self.room, epoch, "Media session rebuilt");
            }
            Err(e) => {
                warn!(room = %self.room, "Failed to rebuild media session: {e}");
                if let Some(delegate) = self.delegate() {
                    delegate.negotiation_failed(e).await;
                }
            }
        }
    }

    /// Handle a media event on the dispatcher
    async fn on_media_event(self: Arc<Self>, event: MediaEvent) {
        match event {
            MediaEvent::TrackAdded(track) => {
                let owner = self.resolve_stream_owner(&track.stream_id).await;
                if let Some(delegate) = self.delegate() {
                    match track.kind {
                        TrackKind::Audio => delegate.remote_audio_track_added(owner, track).await,
                        TrackKind::Video => delegate.remote_video_track_added(owner, track).await,
                    }
                }
            }
            MediaEvent::TrackRemoved(track) => {
                let owner = self.resolve_stream_owner(&track.stream_id).await;
                if let Some(delegate) = self.delegate() {
                    match track.kind {
                        TrackKind::Audio => delegate.remote_audio_track_removed(owner, track).await,
                        TrackKind::Video => delegate.remote_video_track_removed(owner, track).await,
                    }
                }
            }
            MediaEvent::FrameReceived { track, frame } => {
                let owner = self.resolve_stream_owner(&track.stream_id).await;
                if let Some(delegate) = self.delegate() {
                    delegate.video_frame_received(owner, track, frame).await;
                }
            }
            MediaEvent::ConnectionStateChanged(state) => {
                debug!(room = %self.room, ?state, "Media connection state changed");
            }
        }
    }

    /// Resolve the participant owning a media stream, if still present
    ///
    /// Resolution failures degrade to `None`: a track whose owner already
    /// left is still delivered, just unattributed.
    async fn resolve_stream_owner(&self, stream_id: &str) -> Option<Participant> {
        let endpoint_id = endpoint_id_from_stream(stream_id);
        let handle = self.conference_handle()?;
        match self.engine.participant(handle, endpoint_id).await {
            Ok(info) => info.map(Participant::from),
            Err(e) => {
                warn!(
                    room = %self.room,
                    endpoint_id,
                    "Participant resolution failed: {e}"
                );
                None
            }
        }
    }
}

impl Drop for ConferenceInner {
    fn drop(&mut self) {
        // Invalidate the token before the rest of the fields drop; the
        // engine may still hold the sink.
        if let Some(token) = self.token.lock().take() {
            self.registry.unregister(token);
        }
    }
}
