use meshroom_core::{PeerId, RoomErrorCode};
use meshroom_session::{RoomError, RoomState, SessionEvent};

use crate::integration::{connected_session, init_tracing, session_in_new_room};
use crate::utils::{
    EVENT_TIMEOUT_MS, NEGOTIATION_TIMEOUT_MS, eventually, peer_joined, room_error,
};

#[tokio::test]
async fn test_room_expired_tears_down_all_peers() {
    init_tracing();

    let mut session = session_in_new_room("self", "AB12CD").await;
    let p1 = PeerId::from("p1");
    let p2 = PeerId::from("p2");
    session.deliver(peer_joined(&p1)).await;
    session.deliver(peer_joined(&p2)).await;

    let t1 = session
        .transports
        .wait_for_transport(&p1, 1, NEGOTIATION_TIMEOUT_MS)
        .await
        .unwrap();
    let t2 = session
        .transports
        .wait_for_transport(&p2, 1, NEGOTIATION_TIMEOUT_MS)
        .await
        .unwrap();

    session
        .deliver(room_error("ROOM_EXPIRED", "Room has expired"))
        .await;

    let event = session
        .wait_for(|e| matches!(e, SessionEvent::RoomError(_)))
        .await;
    assert_eq!(
        event,
        SessionEvent::RoomError(RoomError {
            code: RoomErrorCode::RoomExpired,
            message: "Room has expired".to_string(),
        })
    );
    session
        .wait_for(|e| matches!(e, SessionEvent::Left { .. }))
        .await;

    let snapshot = session.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.room, RoomState::Idle);
    assert!(snapshot.roster.is_empty());
    assert!(snapshot.engines.is_empty());
    assert!(session.handle.context().list_peers().is_empty());

    assert!(session.render.wait_for_detach(&p1, 1, EVENT_TIMEOUT_MS).await);
    assert!(session.render.wait_for_detach(&p2, 1, EVENT_TIMEOUT_MS).await);
    assert!(eventually(|| t1.is_closed(), EVENT_TIMEOUT_MS).await);
    assert!(eventually(|| t2.is_closed(), EVENT_TIMEOUT_MS).await);
    assert_eq!(session.signaling.count_leaves().await, 0);
}

#[tokio::test]
async fn test_room_full_returns_pending_join_to_idle() {
    init_tracing();

    let mut session = connected_session("self").await;
    session.handle.join_room("AB12CD", "Bob").await.unwrap();

    session.deliver(room_error("ROOM_FULL", "Room is full")).await;
    session
        .wait_for(|e| matches!(e, SessionEvent::RoomError(err) if err.code == RoomErrorCode::RoomFull))
        .await;

    assert_eq!(
        session.handle.snapshot().await.unwrap().room,
        RoomState::Idle
    );
    session
        .handle
        .join_room("CD34EF", "Bob")
        .await
        .expect("a new join is allowed after a failed one");
}

#[tokio::test]
async fn test_non_fatal_error_keeps_active_room() {
    init_tracing();

    let mut session = session_in_new_room("self", "AB12CD").await;
    let p1 = PeerId::from("p1");
    session.deliver(peer_joined(&p1)).await;
    session
        .wait_for(|e| matches!(e, SessionEvent::PeerJoined { .. }))
        .await;

    session
        .deliver(room_error("PEER_NOT_FOUND", "Target peer not found"))
        .await;
    let event = session
        .wait_for(|e| matches!(e, SessionEvent::RoomError(_)))
        .await;
    let SessionEvent::RoomError(err) = event else {
        unreachable!();
    };
    assert!(!err.is_session_fatal());
    assert_eq!(err.code.as_str(), "PEER_NOT_FOUND");

    let snapshot = session.handle.snapshot().await.unwrap();
    assert!(snapshot.room.is_active());
    assert_eq!(snapshot.roster, vec![p1.clone()]);
    assert_eq!(session.render.detach_count(&p1).await, 0);
}
