use crate::error::SessionError;
use crate::media::LocalTracks;
use crate::negotiation::Role;
use crate::room::RoomState;
use meshroom_core::{PeerId, RoomCode};
use tokio::sync::oneshot;

pub type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Requests from a [`SessionHandle`](crate::room::SessionHandle) to its session.
#[derive(Debug)]
pub enum RoomCommand {
    CreateRoom {
        display_name: String,
        ttl_hours: u32,
        max_participants: u32,
        tracks: LocalTracks,
        reply: Reply<()>,
    },

    /// `room_code` has already been validated.
    JoinRoom {
        room_code: RoomCode,
        display_name: String,
        tracks: LocalTracks,
        reply: Reply<()>,
    },

    LeaveRoom { reply: Reply<()> },

    Snapshot { reply: Reply<SessionSnapshot> },
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub self_id: Option<PeerId>,
    pub room: RoomState,
    pub roster: Vec<PeerId>,
    pub engines: Vec<(PeerId, Role)>,
}
