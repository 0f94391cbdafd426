//! Offer/answer negotiation sequence
//!
//! Each remote offer is processed as one queued operation, so negotiations
//! never interleave even though every step is asynchronous. A session
//! terminate bumps the conference media epoch; a negotiation that observes a
//! newer epoch between steps abandons the rest of its sequence, since its
//! session has already been torn down.

use std::sync::Arc;

use tracing::{debug, info};

use crate::conference::ConferenceInner;
use crate::peer::session::MediaSession;
use crate::Result;

/// Observable position of the conference in the negotiation sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationPhase {
    /// No negotiation in progress
    Idle,
    /// Applying the remote offer to the media session
    ApplyingRemoteOffer,
    /// Generating the local answer
    CreatingAnswer,
    /// Applying the local answer to the media session
    ApplyingLocalAnswer,
    /// Transmitting the session-accept to the focus
    SendingAccept,
}

/// A pending remote offer
#[derive(Debug, Clone)]
pub struct RemoteOffer {
    /// Remote session description
    pub sdp: String,
    /// Whether the focus expects a session-accept back
    pub should_send_answer: bool,
}

/// Run the full negotiation sequence for one remote offer
///
/// `epoch` is the media epoch the caller sampled together with `media`; the
/// sequence is abandoned (returning `Ok`) as soon as the conference epoch
/// moves past it. Errors leave the phase at `Idle` and propagate to the
/// caller.
pub(crate) async fn run_negotiation(
    inner: &ConferenceInner,
    media: Arc<dyn MediaSession>,
    offer: RemoteOffer,
    epoch: u64,
) -> Result<()> {
    let result = negotiate(inner, media, &offer, epoch).await;
    inner.set_phase(NegotiationPhase::Idle);
    result
}

async fn negotiate(
    inner: &ConferenceInner,
    media: Arc<dyn MediaSession>,
    offer: &RemoteOffer,
    epoch: u64,
) -> Result<()> {
    if inner.current_epoch() != epoch {
        debug!("Discarding offer for superseded media session");
        return Ok(());
    }

    inner.set_phase(NegotiationPhase::ApplyingRemoteOffer);
    media.set_remote_description(&offer.sdp).await?;

    if inner.current_epoch() != epoch {
        debug!("Media session superseded after remote offer; abandoning negotiation");
        return Ok(());
    }

    inner.set_phase(NegotiationPhase::CreatingAnswer);
    let answer = media.create_answer().await?;

    if inner.current_epoch() != epoch {
        debug!("Media session superseded after answer creation; abandoning negotiation");
        return Ok(());
    }

    inner.set_phase(NegotiationPhase::ApplyingLocalAnswer);
    media.set_local_description(&answer).await?;

    if offer.should_send_answer {
        if inner.current_epoch() != epoch {
            debug!("Media session superseded before accept; abandoning negotiation");
            return Ok(());
        }
        inner.set_phase(NegotiationPhase::SendingAccept);
        inner.send_accept(&answer).await?;
        info!(room = %inner.room, "Negotiation complete, accept transmitted");
    } else {
        info!(room = %inner.room, "Negotiation complete, no accept requested");
    }

    Ok(())
}
