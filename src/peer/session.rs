//! Media session traits and event types

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

/// A locally produced track to attach to the media session
#[derive(Debug, Clone)]
pub struct LocalTrack {
    /// Track identifier within its stream
    pub id: String,
    /// Audio or video
    pub kind: TrackKind,
}

/// A track received from a remote endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    /// Track identifier within its stream
    pub id: String,
    /// Stream identifier; its prefix carries the owner's endpoint id
    pub stream_id: String,
    /// Audio or video
    pub kind: TrackKind,
}

/// One encoded video payload lifted from the media transport
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Encoded payload bytes
    pub payload: Bytes,
    /// RTP timestamp of the packet carrying the payload
    pub rtp_timestamp: u32,
}

/// Aggregate connectivity state of a media session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaConnectionState {
    /// Session created, transport not yet started
    New,
    /// Transport establishment in progress
    Connecting,
    /// Media is flowing
    Connected,
    /// Transport interrupted, may recover
    Disconnected,
    /// Transport failed
    Failed,
    /// Session closed
    Closed,
}

/// Event emitted by a media session toward its observer
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// A remote track became available
    TrackAdded(RemoteTrack),
    /// A remote track stopped delivering media
    TrackRemoved(RemoteTrack),
    /// A video payload arrived on a remote track
    FrameReceived {
        /// The track the payload arrived on
        track: RemoteTrack,
        /// The payload itself
        frame: VideoFrame,
    },
    /// Aggregate connectivity changed
    ConnectionStateChanged(MediaConnectionState),
}

/// Callback receiving media events; may be invoked from any thread
pub type MediaObserver = Arc<dyn Fn(MediaEvent) + Send + Sync>;

/// One negotiable media session
///
/// Descriptions are exchanged as SDP strings. Callers drive the session
/// strictly in the remote-offer/answer sequence; implementations are not
/// required to tolerate out-of-order description application.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Apply the remote session description
    ///
    /// # Errors
    ///
    /// Fails when the description cannot be parsed or applied.
    async fn set_remote_description(&self, sdp: &str) -> Result<()>;

    /// Generate the local answer to the current remote offer
    ///
    /// # Errors
    ///
    /// Fails when no compatible answer can be produced.
    async fn create_answer(&self) -> Result<String>;

    /// Apply the local session description
    ///
    /// # Errors
    ///
    /// Fails when the description cannot be applied.
    async fn set_local_description(&self, sdp: &str) -> Result<()>;

    /// Attach a locally produced track
    ///
    /// # Errors
    ///
    /// Fails when the track cannot be attached to the session.
    async fn add_track(&self, track: &LocalTrack) -> Result<()>;

    /// Close the session, releasing its transport
    async fn close(&self);
}

/// Factory producing media sessions
///
/// A conference calls this once at join and again after every session
/// terminate to rebuild a fresh session for the next offer.
#[async_trait]
pub trait MediaSessionFactory: Send + Sync {
    /// Create a session delivering its events to `observer`
    ///
    /// # Errors
    ///
    /// Fails when the underlying media stack cannot allocate a session.
    async fn create(&self, observer: MediaObserver) -> Result<Arc<dyn MediaSession>>;
}
