//! WebRTC-backed media session
//!
//! Wraps a peer connection from the `webrtc` crate behind the
//! [`MediaSession`] trait. Remote tracks are surfaced as events: each
//! incoming track spawns a read loop that forwards video payloads to the
//! observer until the track ends.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

use crate::config::RoomlinkConfig;
use crate::peer::session::{
    LocalTrack, MediaConnectionState, MediaEvent, MediaObserver, MediaSession,
    MediaSessionFactory, RemoteTrack, TrackKind, VideoFrame,
};
use crate::{Error, Result};

/// Builds [`RtcMediaSession`]s configured from a [`RoomlinkConfig`]
pub struct RtcMediaSessionFactory {
    config: RoomlinkConfig,
}

impl RtcMediaSessionFactory {
    /// Create a factory using `config` for ICE servers
    pub fn new(config: RoomlinkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MediaSessionFactory for RtcMediaSessionFactory {
    async fn create(&self, observer: MediaObserver) -> Result<Arc<dyn MediaSession>> {
        let session = RtcMediaSession::new(&self.config, observer).await?;
        Ok(Arc::new(session))
    }
}

/// Media session over a real peer connection
pub struct RtcMediaSession {
    pc: Arc<RTCPeerConnection>,
    // Senders must outlive the tracks they carry or the connection stops
    // transmitting them.
    senders: RwLock<Vec<Arc<RTCRtpSender>>>,
}

impl RtcMediaSession {
    async fn new(config: &RoomlinkConfig, observer: MediaObserver) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| Error::Media(format!("Failed to register codecs: {e}")))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| Error::Media(format!("Failed to register interceptors: {e}")))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: config.stun_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| Error::Media(format!("Failed to create peer connection: {e}")))?,
        );

        Self::wire_handlers(&pc, observer);

        debug!("Created media session");
        Ok(Self {
            pc,
            senders: RwLock::new(Vec::new()),
        })
    }

    fn wire_handlers(pc: &Arc<RTCPeerConnection>, observer: MediaObserver) {
        let track_observer = observer.clone();
        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let observer = track_observer.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                let remote = RemoteTrack {
                    id: track.id(),
                    stream_id: track.stream_id(),
                    kind,
                };
                info!(
                    track_id = %remote.id,
                    stream_id = %remote.stream_id,
                    ?kind,
                    "Remote track added"
                );
                observer(MediaEvent::TrackAdded(remote.clone()));

                // Drain the track until it ends; read_rtp failing means the
                // remote side stopped the track or the session closed.
                loop {
                    match track.read_rtp().await {
                        Ok((packet, _attrs)) => {
                            if remote.kind == TrackKind::Video {
                                observer(MediaEvent::FrameReceived {
                                    track: remote.clone(),
                                    frame: VideoFrame {
                                        payload: packet.payload,
                                        rtp_timestamp: packet.header.timestamp,
                                    },
                                });
                            }
                        }
                        Err(_) => break,
                    }
                }
                info!(track_id = %remote.id, "Remote track ended");
                observer(MediaEvent::TrackRemoved(remote));
            })
        }));

        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let mapped = match state {
                RTCPeerConnectionState::New => MediaConnectionState::New,
                RTCPeerConnectionState::Connecting => MediaConnectionState::Connecting,
                RTCPeerConnectionState::Connected => MediaConnectionState::Connected,
                RTCPeerConnectionState::Disconnected => MediaConnectionState::Disconnected,
                RTCPeerConnectionState::Failed => MediaConnectionState::Failed,
                _ => MediaConnectionState::Closed,
            };
            info!(state = ?mapped, "Media connection state changed");
            observer(MediaEvent::ConnectionStateChanged(mapped));
            Box::pin(async {})
        }));

        pc.on_ice_connection_state_change(Box::new(move |state| {
            debug!(?state, "ICE connection state changed");
            Box::pin(async {})
        }));
    }
}

#[async_trait]
impl MediaSession for RtcMediaSession {
    async fn set_remote_description(&self, sdp: &str) -> Result<()> {
        let offer = RTCSessionDescription::offer(sdp.to_string())
            .map_err(|e| Error::Negotiation(format!("Malformed remote offer: {e}")))?;
        self.pc
            .set_remote_description(offer)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to apply remote offer: {e}")))
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to create answer: {e}")))?;
        Ok(answer.sdp)
    }

    async fn set_local_description(&self, sdp: &str) -> Result<()> {
        let answer = RTCSessionDescription::answer(sdp.to_string())
            .map_err(|e| Error::Negotiation(format!("Malformed local answer: {e}")))?;
        self.pc
            .set_local_description(answer)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to apply local answer: {e}")))
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        let (capability, stream_id) = match track.kind {
            TrackKind::Audio => (
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_string(),
                    clock_rate: 48000,
                    channels: 2,
                    sdp_fmtp_line: String::new(),
                    rtcp_feedback: vec![],
                },
                "roomlink-audio".to_string(),
            ),
            TrackKind::Video => (
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_string(),
                    clock_rate: 90000,
                    channels: 0,
                    sdp_fmtp_line: String::new(),
                    rtcp_feedback: vec![],
                },
                "roomlink-video".to_string(),
            ),
        };

        let local: Arc<dyn TrackLocal + Send + Sync> = Arc::new(TrackLocalStaticSample::new(
            capability,
            track.id.clone(),
            stream_id,
        ));

        let sender = self
            .pc
            .add_track(local)
            .await
            .map_err(|e| Error::Media(format!("Failed to add track {}: {e}", track.id)))?;
        self.senders.write().await.push(sender);
        debug!(track_id = %track.id, kind = ?track.kind, "Attached local track");
        Ok(())
    }

    async fn close(&self) {
        self.senders.write().await.clear();
        if let Err(e) = self.pc.close().await {
            warn!("Error closing peer connection: {e}");
        }
    }
}
