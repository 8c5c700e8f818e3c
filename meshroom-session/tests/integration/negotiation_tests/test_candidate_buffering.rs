use std::time::Duration;

use meshroom_core::{IceCandidate, PeerId, PeerSummary, RoomCode, SdpType, ServerMessage, SessionDescription, SignalType};
use meshroom_session::SessionEvent;

use crate::integration::{connected_session, init_tracing, session_in_new_room};
use crate::utils::{
    NEGOTIATION_TIMEOUT_MS, TransportCall, answer_from, candidate_from, offer_from, peer_joined,
    server,
};

#[tokio::test]
async fn test_answerer_applies_early_candidates_after_offer_in_order() {
    init_tracing();

    let mut session = connected_session("self").await;
    session.handle.join_room("AB12CD", "Bob").await.unwrap();
    session
        .deliver(server(ServerMessage::Joined {
            room_code: RoomCode::parse("AB12CD").unwrap(),
            peers: vec![PeerSummary::new("p2")],
            your_socket_id: None,
        }))
        .await;
    session
        .wait_for(|e| matches!(e, SessionEvent::Joined { .. }))
        .await;

    let p2 = PeerId::from("p2");
    for c in ["c1", "c2", "c3"] {
        session.deliver(candidate_from(&p2, c)).await;
    }

    let transport = session
        .transports
        .wait_for_transport(&p2, 1, NEGOTIATION_TIMEOUT_MS)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(
        transport.calls().await.is_empty(),
        "candidates must wait for the remote description"
    );

    session.deliver(offer_from(&p2, "offer-from-p2")).await;
    assert!(
        session
            .signaling
            .wait_for_signal(&p2, SignalType::Answer, 1, NEGOTIATION_TIMEOUT_MS)
            .await
            .is_some()
    );

    assert_eq!(
        transport.calls().await,
        vec![
            TransportCall::SetRemote(SessionDescription::offer("offer-from-p2")),
            TransportCall::AddCandidate(IceCandidate::new("c1")),
            TransportCall::AddCandidate(IceCandidate::new("c2")),
            TransportCall::AddCandidate(IceCandidate::new("c3")),
            TransportCall::CreateAnswer,
            TransportCall::SetLocal(SdpType::Answer),
        ]
    );

    session.deliver(candidate_from(&p2, "c4")).await;
    assert!(
        transport
            .wait_for_call(
                |c| matches!(c, TransportCall::AddCandidate(_)),
                4,
                NEGOTIATION_TIMEOUT_MS
            )
            .await
    );
    assert_eq!(
        transport.applied_candidates().await,
        vec!["c1", "c2", "c3", "c4"]
    );
}

#[tokio::test]
async fn test_offerer_queues_candidates_until_answer() {
    init_tracing();

    let session = session_in_new_room("self", "AB12CD").await;
    let p1 = PeerId::from("p1");
    session.deliver(peer_joined(&p1)).await;
    assert!(
        session
            .signaling
            .wait_for_signal(&p1, SignalType::Offer, 1, NEGOTIATION_TIMEOUT_MS)
            .await
            .is_some()
    );

    session.deliver(candidate_from(&p1, "early-1")).await;
    session.deliver(candidate_from(&p1, "early-2")).await;
    session.deliver(answer_from(&p1, "answer-from-p1")).await;

    let transport = session.transports.transports_for(&p1).await.remove(0);
    assert!(
        transport
            .wait_for_call(
                |c| matches!(c, TransportCall::AddCandidate(_)),
                2,
                NEGOTIATION_TIMEOUT_MS
            )
            .await
    );

    let calls = transport.calls().await;
    let remote_at = calls
        .iter()
        .position(|c| matches!(c, TransportCall::SetRemote(_)))
        .expect("answer applied");
    let first_candidate_at = calls
        .iter()
        .position(|c| matches!(c, TransportCall::AddCandidate(_)))
        .expect("candidate applied");
    assert!(remote_at < first_candidate_at);
    assert_eq!(
        transport.applied_candidates().await,
        vec!["early-1", "early-2"]
    );
}

#[tokio::test]
async fn test_local_candidates_are_forwarded() {
    init_tracing();

    let session = session_in_new_room("self", "AB12CD").await;
    let p1 = PeerId::from("p1");
    session.deliver(peer_joined(&p1)).await;

    let transport = session
        .transports
        .wait_for_transport(&p1, 1, NEGOTIATION_TIMEOUT_MS)
        .await
        .unwrap();
    assert!(transport.gather("candidate:1 1 udp 2122260223 10.0.0.2 50000 typ host"));

    let payload = session
        .signaling
        .wait_for_signal(&p1, SignalType::Candidate, 1, NEGOTIATION_TIMEOUT_MS)
        .await
        .expect("candidate forwarded");
    let candidate: IceCandidate = serde_json::from_value(payload).unwrap();
    assert_eq!(
        candidate.candidate,
        "candidate:1 1 udp 2122260223 10.0.0.2 50000 typ host"
    );
}
