use std::sync::Arc;

use meshroom_session::{LocalMediaError, RoomState, SessionError};

use crate::integration::{create_test_session_with_media, init_tracing};
use crate::utils::{DeniedMediaSource, connected};

#[tokio::test]
async fn test_media_failure_aborts_create_and_join() {
    init_tracing();

    let session = create_test_session_with_media(Arc::new(DeniedMediaSource));
    session.deliver(connected("self")).await;

    let err = session.handle.create_room("Alice", 24, 50).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::LocalMedia(LocalMediaError::PermissionDenied)
    ));

    let err = session.handle.join_room("AB12CD", "Alice").await.unwrap_err();
    assert!(matches!(err, SessionError::LocalMedia(_)));

    assert_eq!(session.signaling.count().await, 0);
    assert_eq!(
        session.handle.snapshot().await.unwrap().room,
        RoomState::Idle
    );
}
