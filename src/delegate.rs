//! Application-facing conference delegate

use async_trait::async_trait;

use crate::conference::participant::Participant;
use crate::peer::session::{RemoteTrack, VideoFrame};
use crate::Error;

/// Receives conference events on the dispatcher
///
/// All methods run serially on the conference dispatcher; an implementation
/// never sees two invocations concurrently. Track and frame events carry the
/// resolved owner when the sending participant is still in the room, `None`
/// when it has already left.
#[async_trait]
pub trait ConferenceDelegate: Send + Sync {
    /// A remote participant entered the room
    async fn participant_joined(&self, participant: Participant);

    /// A remote participant left the room
    async fn participant_left(&self, participant: Participant);

    /// A remote audio track became available
    async fn remote_audio_track_added(&self, owner: Option<Participant>, track: RemoteTrack);

    /// A remote audio track stopped delivering media
    async fn remote_audio_track_removed(&self, owner: Option<Participant>, track: RemoteTrack);

    /// A remote video track became available
    async fn remote_video_track_added(&self, owner: Option<Participant>, track: RemoteTrack);

    /// A remote video track stopped delivering media
    async fn remote_video_track_removed(&self, owner: Option<Participant>, track: RemoteTrack);

    /// An encoded video payload arrived on a remote track
    async fn video_frame_received(
        &self,
        owner: Option<Participant>,
        track: RemoteTrack,
        frame: VideoFrame,
    );

    /// The focus terminated the media session
    ///
    /// The conference rebuilds a fresh media session after this returns; the
    /// next offer negotiates against the rebuilt session.
    async fn session_terminated(&self);

    /// A negotiation attempt failed
    ///
    /// The failed offer is abandoned; later offers are still processed.
    async fn negotiation_failed(&self, _error: Error) {}
}
