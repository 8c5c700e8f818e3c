use crate::error::SessionError;
use crate::media::LocalMediaSource;
use crate::room::{Reply, RoomCommand, SessionContext, SessionSnapshot};
use meshroom_core::RoomCode;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Cloneable front end of a [`RoomSession`](crate::room::RoomSession).
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<RoomCommand>,
    media: Arc<dyn LocalMediaSource>,
    context: SessionContext,
}

impl SessionHandle {
    pub(crate) fn new(
        tx: mpsc::Sender<RoomCommand>,
        media: Arc<dyn LocalMediaSource>,
        context: SessionContext,
    ) -> Self {
        Self { tx, media, context }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Acquires local media and asks the server for a new room.
    ///
    /// Completion is reported as [`SessionEvent::RoomCreated`](crate::room::SessionEvent).
    pub async fn create_room(
        &self,
        display_name: impl Into<String>,
        ttl_hours: u32,
        max_participants: u32,
    ) -> Result<(), SessionError> {
        self.ensure_connected()?;
        let tracks = self.media.acquire().await?;
        let display_name = display_name.into();

        self.request(|reply| RoomCommand::CreateRoom {
            display_name,
            ttl_hours,
            max_participants,
            tracks,
            reply,
        })
        .await
    }

    /// Validates `room_code`, acquires local media and asks to join.
    ///
    /// An invalid code is rejected before anything is sent.
    pub async fn join_room(
        &self,
        room_code: &str,
        display_name: impl Into<String>,
    ) -> Result<(), SessionError> {
        let room_code = RoomCode::parse(room_code)?;
        self.ensure_connected()?;
        let tracks = self.media.acquire().await?;
        let display_name = display_name.into();

        self.request(|reply| RoomCommand::JoinRoom {
            room_code,
            display_name,
            tracks,
            reply,
        })
        .await
    }

    /// Leaves the current room. Does nothing outside a room.
    pub async fn leave_room(&self) -> Result<(), SessionError> {
        self.request(|reply| RoomCommand::LeaveRoom { reply }).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(build(reply)).await.is_err() {
            return Err(self.closed_error());
        }
        rx.await.map_err(|_| self.closed_error())?
    }

    fn ensure_connected(&self) -> Result<(), SessionError> {
        match self.context.transport_error() {
            Some(e) => Err(SessionError::Transport(e.clone())),
            None => Ok(()),
        }
    }

    fn closed_error(&self) -> SessionError {
        match self.context.transport_error() {
            Some(e) => SessionError::Transport(e.clone()),
            None => SessionError::SessionClosed,
        }
    }
}
