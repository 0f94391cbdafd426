//! Offer/answer negotiation behavior against scripted collaborators

mod common;

use common::{join_room, pump};
use roomlink::{NegotiationPhase, SignallingNotification};
use std::sync::atomic::Ordering;

fn offer(sdp: &str, should_send_answer: bool) -> SignallingNotification {
    SignallingNotification::OfferReceived {
        sdp: sdp.to_string(),
        should_send_answer,
    }
}

#[tokio::test]
async fn test_offer_with_answer_requested_transmits_accept() {
    let mut h = join_room().await;

    assert!(h.engine.deliver(offer("offer-1", true)));
    pump(&mut h.dispatcher).await;

    let steps = h.factory.steps.lock().clone();
    assert_eq!(
        steps,
        vec![
            "s0:set_remote:offer-1",
            "s0:create_answer",
            "s0:set_local:answer-0",
        ]
    );
    assert_eq!(*h.engine.accepts.lock(), vec!["answer-0"]);
    assert_eq!(h.conference.negotiation_phase(), NegotiationPhase::Idle);
}

#[tokio::test]
async fn test_offer_without_answer_applies_but_skips_accept() {
    let mut h = join_room().await;

    assert!(h.engine.deliver(offer("offer-1", false)));
    pump(&mut h.dispatcher).await;

    // Local description is still applied; only the accept is skipped.
    let steps = h.factory.steps.lock().clone();
    assert_eq!(
        steps,
        vec![
            "s0:set_remote:offer-1",
            "s0:create_answer",
            "s0:set_local:answer-0",
        ]
    );
    assert!(h.engine.accepts.lock().is_empty());
}

#[tokio::test]
async fn test_negotiations_never_interleave() {
    let mut h = join_room().await;

    // Both offers are queued before the dispatcher runs; every mock step
    // yields, so interleaving would show up in the step log.
    assert!(h.engine.deliver(offer("offer-a", true)));
    assert!(h.engine.deliver(offer("offer-b", true)));
    pump(&mut h.dispatcher).await;

    let steps = h.factory.steps.lock().clone();
    assert_eq!(
        steps,
        vec![
            "s0:set_remote:offer-a",
            "s0:create_answer",
            "s0:set_local:answer-0",
            "s0:set_remote:offer-b",
            "s0:create_answer",
            "s0:set_local:answer-0",
        ]
    );
    assert_eq!(*h.engine.accepts.lock(), vec!["answer-0", "answer-0"]);
}

#[tokio::test]
async fn test_negotiation_fault_reported_and_later_offers_still_processed() {
    let mut h = join_room().await;

    h.factory.session(0).fail_answer.store(true, Ordering::SeqCst);
    assert!(h.engine.deliver(offer("offer-bad", true)));
    pump(&mut h.dispatcher).await;

    assert!(h.engine.accepts.lock().is_empty());
    assert_eq!(h.conference.negotiation_phase(), NegotiationPhase::Idle);
    let events = h.delegate.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].starts_with("negotiation_failed:"));

    // The failed offer is abandoned; the next one succeeds.
    h.factory.session(0).fail_answer.store(false, Ordering::SeqCst);
    assert!(h.engine.deliver(offer("offer-good", true)));
    pump(&mut h.dispatcher).await;

    assert_eq!(*h.engine.accepts.lock(), vec!["answer-0"]);
}

#[tokio::test]
async fn test_local_tracks_attached_at_join() {
    let h = join_room().await;

    let tracks = h.factory.session(0).tracks.lock().clone();
    let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["mic", "cam"]);
}
