//! Media session abstraction and the WebRTC-backed implementation
//!
//! The negotiation machinery drives media through the [`MediaSession`] trait
//! so tests can substitute scripted sessions; production hosts use
//! [`RtcMediaSessionFactory`](crate::RtcMediaSessionFactory), which builds
//! sessions on top of a real peer connection.

pub mod engine;
pub mod session;

pub use engine::RtcMediaSessionFactory;
pub use session::{
    LocalTrack, MediaConnectionState, MediaEvent, MediaObserver, MediaSession,
    MediaSessionFactory, RemoteTrack, TrackKind, VideoFrame,
};
