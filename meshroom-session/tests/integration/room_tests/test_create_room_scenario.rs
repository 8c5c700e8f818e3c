use meshroom_core::{
    ClientMessage, IceCandidate, PeerId, RoomCode, SdpType, SessionDescription, SignalType,
};
use meshroom_session::{NegotiationState, Role, RoomState, SessionEvent};

use crate::integration::{init_tracing, session_in_new_room};
use crate::utils::{
    EVENT_TIMEOUT_MS, NEGOTIATION_TIMEOUT_MS, TransportCall, answer_from, candidate_from,
    eventually, peer_joined, peer_left,
};

#[tokio::test]
async fn test_creator_offers_to_joiner_and_tears_down_on_leave() {
    init_tracing();

    let mut session = session_in_new_room("self", "AB12CD").await;

    let messages = session.signaling.messages().await;
    assert!(matches!(
        &messages[0],
        ClientMessage::CreateRoom {
            ttl_hours: 24,
            max_participants: 50,
            ..
        }
    ));

    let snapshot = session.handle.snapshot().await.unwrap();
    assert_eq!(
        snapshot.room,
        RoomState::Active(RoomCode::parse("AB12CD").unwrap())
    );
    assert!(snapshot.roster.is_empty());
    assert!(snapshot.engines.is_empty());
    assert_eq!(session.transports.total_created().await, 0);

    let p1 = PeerId::from("p1");
    session.deliver(peer_joined(&p1)).await;

    let offer = session
        .signaling
        .wait_for_signal(&p1, SignalType::Offer, 1, NEGOTIATION_TIMEOUT_MS)
        .await
        .expect("offer should be sent to p1");
    let offer: SessionDescription = serde_json::from_value(offer).unwrap();
    assert_eq!(offer.sdp_type, SdpType::Offer);

    let transport = session
        .transports
        .wait_for_transport(&p1, 1, NEGOTIATION_TIMEOUT_MS)
        .await
        .expect("transport for p1");

    session.deliver(answer_from(&p1, "answer-from-p1")).await;
    session.deliver(candidate_from(&p1, "cand-1")).await;
    session.deliver(candidate_from(&p1, "cand-2")).await;

    assert!(
        transport
            .wait_for_call(
                |c| matches!(c, TransportCall::AddCandidate(_)),
                2,
                NEGOTIATION_TIMEOUT_MS
            )
            .await
    );
    assert_eq!(
        transport.calls().await,
        vec![
            TransportCall::CreateOffer,
            TransportCall::SetLocal(SdpType::Offer),
            TransportCall::SetRemote(SessionDescription::answer("answer-from-p1")),
            TransportCall::AddCandidate(IceCandidate::new("cand-1")),
            TransportCall::AddCandidate(IceCandidate::new("cand-2")),
        ]
    );

    let status = session.handle.context().peer_status(&p1).unwrap();
    assert_eq!(status.role, Role::Offerer);
    assert_eq!(status.state, NegotiationState::RemoteDescriptionSet);

    session.deliver(peer_left(&p1)).await;
    session
        .wait_for(|e| matches!(e, SessionEvent::PeerLeft { peer_id } if peer_id.as_str() == "p1"))
        .await;

    assert!(session.render.wait_for_detach(&p1, 1, EVENT_TIMEOUT_MS).await);
    assert!(eventually(|| transport.is_closed(), EVENT_TIMEOUT_MS).await);

    let snapshot = session.handle.snapshot().await.unwrap();
    assert!(snapshot.roster.is_empty());
    assert!(snapshot.engines.is_empty());
    assert!(session.handle.context().peer_status(&p1).is_none());
}

#[tokio::test]
async fn test_second_create_is_rejected_while_room_active() {
    init_tracing();

    let session = session_in_new_room("self", "AB12CD").await;

    let err = session
        .handle
        .create_room("Alice", 24, 50)
        .await
        .expect_err("second create must fail");
    assert!(matches!(err, meshroom_session::SessionError::AlreadyInRoom));

    let err = session
        .handle
        .join_room("ZZ99ZZ", "Alice")
        .await
        .expect_err("join while active must fail");
    assert!(matches!(err, meshroom_session::SessionError::AlreadyInRoom));

    assert_eq!(session.signaling.count().await, 1);
}
