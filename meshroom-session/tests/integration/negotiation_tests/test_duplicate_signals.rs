use std::time::Duration;

use meshroom_core::{PeerId, SignalType};
use meshroom_session::{NegotiationState, Role, SessionEvent};

use crate::integration::{connected_session, init_tracing, session_in_new_room};
use crate::utils::{
    NEGOTIATION_TIMEOUT_MS, candidate_from, offer_from, peer_joined, peer_left,
    signal_from,
};

#[tokio::test]
async fn test_signal_from_unknown_peer_creates_one_answerer() {
    init_tracing();

    let session = session_in_new_room("self", "AB12CD").await;
    let p9 = PeerId::from("p9");

    session.deliver(offer_from(&p9, "offer-1")).await;
    session.deliver(offer_from(&p9, "offer-2")).await;
    assert!(
        session
            .signaling
            .wait_for_signal(&p9, SignalType::Answer, 2, NEGOTIATION_TIMEOUT_MS)
            .await
            .is_some()
    );

    assert_eq!(session.transports.transports_for(&p9).await.len(), 1);
    let snapshot = session.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.roster, vec![p9.clone()]);
    assert_eq!(snapshot.engines, vec![(p9.clone(), Role::Answerer)]);

    // A late peer_joined keeps the existing engine and its role.
    session.deliver(peer_joined(&p9)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        session.handle.snapshot().await.unwrap().engines,
        vec![(p9.clone(), Role::Answerer)]
    );
    assert_eq!(
        session.signaling.count_signals(&p9, SignalType::Offer).await,
        0
    );
}

#[tokio::test]
async fn test_rejoining_peer_gets_a_fresh_engine() {
    init_tracing();

    let mut session = session_in_new_room("self", "AB12CD").await;
    let p1 = PeerId::from("p1");

    session.deliver(peer_joined(&p1)).await;
    session
        .wait_for(|e| matches!(e, SessionEvent::PeerJoined { .. }))
        .await;
    let first = session.handle.context().peer_status(&p1).unwrap();

    session.deliver(peer_left(&p1)).await;
    session
        .wait_for(|e| matches!(e, SessionEvent::PeerLeft { .. }))
        .await;
    session.deliver(peer_joined(&p1)).await;
    session
        .wait_for(|e| matches!(e, SessionEvent::PeerJoined { .. }))
        .await;

    let second = session.handle.context().peer_status(&p1).unwrap();
    assert_ne!(first.engine_id, second.engine_id);
    assert!(
        session
            .transports
            .wait_for_transport(&p1, 2, NEGOTIATION_TIMEOUT_MS)
            .await
            .is_some()
    );
    assert!(
        session
            .signaling
            .wait_for_signal(&p1, SignalType::Offer, 2, NEGOTIATION_TIMEOUT_MS)
            .await
            .is_some()
    );
}

#[tokio::test]
async fn test_signals_outside_room_or_from_self_are_ignored() {
    init_tracing();

    let session = connected_session("self").await;
    let p1 = PeerId::from("p1");
    session.deliver(offer_from(&p1, "offer")).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.transports.total_created().await, 0);

    let session = session_in_new_room("self", "AB12CD").await;
    session
        .deliver(offer_from(&PeerId::from("self"), "loopback"))
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.transports.total_created().await, 0);
    assert!(session.handle.snapshot().await.unwrap().roster.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_is_dropped() {
    init_tracing();

    let session = session_in_new_room("self", "AB12CD").await;
    let p1 = PeerId::from("p1");
    session.deliver(peer_joined(&p1)).await;
    assert!(
        session
            .render
            .wait_for_state(&p1, NegotiationState::OfferSent, NEGOTIATION_TIMEOUT_MS)
            .await
    );

    session
        .deliver(signal_from(
            &p1,
            SignalType::Answer,
            &serde_json::json!({"unexpected": true}),
        ))
        .await;
    session.deliver(candidate_from(&p1, "still-works")).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = session.handle.context().peer_status(&p1).unwrap();
    assert_eq!(status.state, NegotiationState::OfferSent);
    assert_eq!(session.transports.transports_for(&p1).await.len(), 1);
}
