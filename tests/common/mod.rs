//! Shared fixtures: a scripted signalling engine, a mock media stack, and a
//! recording delegate

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use roomlink::{
    Conference, ConferenceDelegate, Connection, Dispatcher, EngineConference, EngineConnection,
    Error, LocalTrack, MediaEvent, MediaObserver, MediaSession, MediaSessionFactory,
    NotificationSink, Participant, ParticipantInfo, RemoteTrack, Result, RoomlinkConfig,
    SignallingContext, SignallingEngine, SignallingNotification, TrackKind, VideoFrame,
};

/// A fully joined conference with its collaborators
pub struct Harness {
    pub engine: Arc<ScriptedEngine>,
    pub factory: Arc<MockMediaFactory>,
    pub delegate: Arc<RecordingDelegate>,
    pub context: SignallingContext,
    pub connection: Connection,
    pub conference: Conference,
    pub dispatcher: Dispatcher,
}

/// Stand up a context, connect, and join a room with one audio and one
/// video track
pub async fn join_room() -> Harness {
    let engine = ScriptedEngine::new();
    let factory = MockMediaFactory::new();
    let delegate = RecordingDelegate::new();

    let (context, dispatcher) = SignallingContext::create(
        engine.clone(),
        factory.clone(),
        RoomlinkConfig::default(),
    )
    .await
    .unwrap();

    let connection = context.connect().await.unwrap();
    let conference = connection
        .join(
            "orchard",
            "alice",
            vec![
                LocalTrack {
                    id: "mic".to_string(),
                    kind: TrackKind::Audio,
                },
                LocalTrack {
                    id: "cam".to_string(),
                    kind: TrackKind::Video,
                },
            ],
            delegate.clone(),
        )
        .await
        .unwrap();

    Harness {
        engine,
        factory,
        delegate,
        context,
        connection,
        conference,
        dispatcher,
    }
}

/// Drain every queued operation
pub async fn pump(dispatcher: &mut Dispatcher) {
    while dispatcher.tick().await {}
}

/// Signalling engine whose behavior is scripted from the test body
pub struct ScriptedEngine {
    pub fail_connect: AtomicBool,
    pub fail_join: AtomicBool,
    pub participants: Mutex<HashMap<String, ParticipantInfo>>,
    pub last_sink: Mutex<Option<NotificationSink>>,
    pub accepts: Mutex<Vec<String>>,
    pub released_connections: AtomicUsize,
    pub released_conferences: AtomicUsize,
    next_handle: AtomicU64,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_connect: AtomicBool::new(false),
            fail_join: AtomicBool::new(false),
            participants: Mutex::new(HashMap::new()),
            last_sink: Mutex::new(None),
            accepts: Mutex::new(Vec::new()),
            released_connections: AtomicUsize::new(0),
            released_conferences: AtomicUsize::new(0),
            next_handle: AtomicU64::new(1),
        })
    }

    pub fn add_participant(&self, endpoint_id: &str, jid: &str, nick: Option<&str>) {
        self.participants.lock().insert(
            endpoint_id.to_string(),
            ParticipantInfo {
                jid: jid.to_string(),
                nick: nick.map(str::to_string),
                endpoint_id: endpoint_id.to_string(),
            },
        );
    }

    pub fn remove_participant(&self, endpoint_id: &str) {
        self.participants.lock().remove(endpoint_id);
    }

    /// Deliver a notification through the sink captured at join
    pub fn deliver(&self, notification: SignallingNotification) -> bool {
        let sink = self.last_sink.lock().clone();
        match sink {
            Some(sink) => sink.deliver(notification),
            None => false,
        }
    }
}

#[async_trait]
impl SignallingEngine for ScriptedEngine {
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    async fn connect(
        &self,
        _url: &str,
        _domain: &str,
        _tls_insecure: bool,
    ) -> Result<EngineConnection> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(Error::Signalling("scripted connect failure".to_string()));
        }
        Ok(EngineConnection(
            self.next_handle.fetch_add(1, Ordering::SeqCst),
        ))
    }

    fn release_connection(&self, _conn: EngineConnection) {
        self.released_connections.fetch_add(1, Ordering::SeqCst);
    }

    async fn join(
        &self,
        _conn: EngineConnection,
        _room: &str,
        _nick: &str,
        sink: NotificationSink,
    ) -> Result<EngineConference> {
        if self.fail_join.load(Ordering::SeqCst) {
            return Err(Error::Signalling("scripted join failure".to_string()));
        }
        *self.last_sink.lock() = Some(sink);
        Ok(EngineConference(
            self.next_handle.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn accept(&self, _conf: EngineConference, sdp: &str) -> Result<()> {
        self.accepts.lock().push(sdp.to_string());
        Ok(())
    }

    async fn participant(
        &self,
        _conf: EngineConference,
        endpoint_id: &str,
    ) -> Result<Option<ParticipantInfo>> {
        Ok(self.participants.lock().get(endpoint_id).cloned())
    }

    async fn local_endpoint_id(&self, _conf: EngineConference) -> Result<String> {
        Ok("local".to_string())
    }

    fn release_conference(&self, _conf: EngineConference) {
        self.released_conferences.fetch_add(1, Ordering::SeqCst);
    }
}

/// Media factory producing scripted sessions with a shared step log
pub struct MockMediaFactory {
    pub fail_create: AtomicBool,
    pub sessions: Mutex<Vec<Arc<MockMediaSession>>>,
    pub steps: Arc<Mutex<Vec<String>>>,
}

impl MockMediaFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_create: AtomicBool::new(false),
            sessions: Mutex::new(Vec::new()),
            steps: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn session(&self, index: usize) -> Arc<MockMediaSession> {
        Arc::clone(&self.sessions.lock()[index])
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[async_trait]
impl MediaSessionFactory for MockMediaFactory {
    async fn create(&self, observer: MediaObserver) -> Result<Arc<dyn MediaSession>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::Media("scripted create failure".to_string()));
        }
        let index = self.sessions.lock().len();
        let session = Arc::new(MockMediaSession {
            index,
            observer,
            steps: Arc::clone(&self.steps),
            fail_answer: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            tracks: Mutex::new(Vec::new()),
        });
        self.sessions.lock().push(Arc::clone(&session));
        Ok(session)
    }
}

/// Media session that records every step and yields inside each one
pub struct MockMediaSession {
    pub index: usize,
    observer: MediaObserver,
    steps: Arc<Mutex<Vec<String>>>,
    pub fail_answer: AtomicBool,
    pub closed: AtomicBool,
    pub tracks: Mutex<Vec<LocalTrack>>,
}

impl MockMediaSession {
    /// Fire a media event as the underlying engine would
    pub fn emit(&self, event: MediaEvent) {
        (self.observer)(event);
    }
}

#[async_trait]
impl MediaSession for MockMediaSession {
    async fn set_remote_description(&self, sdp: &str) -> Result<()> {
        self.steps
            .lock()
            .push(format!("s{}:set_remote:{}", self.index, sdp));
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn create_answer(&self) -> Result<String> {
        self.steps.lock().push(format!("s{}:create_answer", self.index));
        tokio::task::yield_now().await;
        if self.fail_answer.load(Ordering::SeqCst) {
            return Err(Error::Negotiation("scripted answer failure".to_string()));
        }
        Ok(format!("answer-{}", self.index))
    }

    async fn set_local_description(&self, sdp: &str) -> Result<()> {
        self.steps
            .lock()
            .push(format!("s{}:set_local:{}", self.index, sdp));
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        self.tracks.lock().push(track.clone());
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.steps.lock().push(format!("s{}:close", self.index));
    }
}

/// Delegate that records every event as a compact string
pub struct RecordingDelegate {
    pub events: Mutex<Vec<String>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn owner_tag(owner: &Option<Participant>) -> String {
        match owner {
            Some(p) => p.endpoint_id.clone(),
            None => "none".to_string(),
        }
    }
}

#[async_trait]
impl ConferenceDelegate for RecordingDelegate {
    async fn participant_joined(&self, participant: Participant) {
        self.events
            .lock()
            .push(format!("joined:{}", participant.endpoint_id));
    }

    async fn participant_left(&self, participant: Participant) {
        self.events
            .lock()
            .push(format!("left:{}", participant.endpoint_id));
    }

    async fn remote_audio_track_added(&self, owner: Option<Participant>, track: RemoteTrack) {
        self.events
            .lock()
            .push(format!("audio_added:{}:{}", Self::owner_tag(&owner), track.id));
    }

    async fn remote_audio_track_removed(&self, owner: Option<Participant>, track: RemoteTrack) {
        self.events.lock().push(format!(
            "audio_removed:{}:{}",
            Self::owner_tag(&owner),
            track.id
        ));
    }

    async fn remote_video_track_added(&self, owner: Option<Participant>, track: RemoteTrack) {
        self.events
            .lock()
            .push(format!("video_added:{}:{}", Self::owner_tag(&owner), track.id));
    }

    async fn remote_video_track_removed(&self, owner: Option<Participant>, track: RemoteTrack) {
        self.events.lock().push(format!(
            "video_removed:{}:{}",
            Self::owner_tag(&owner),
            track.id
        ));
    }

    async fn video_frame_received(
        &self,
        owner: Option<Participant>,
        track: RemoteTrack,
        frame: VideoFrame,
    ) {
        self.events.lock().push(format!(
            "frame:{}:{}:{}",
            Self::owner_tag(&owner),
            track.id,
            frame.rtp_timestamp
        ));
    }

    async fn session_terminated(&self) {
        self.events.lock().push("terminated".to_string());
    }

    async fn negotiation_failed(&self, error: Error) {
        self.events
            .lock()
            .push(format!("negotiation_failed:{error}"));
    }
}
