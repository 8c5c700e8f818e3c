use meshroom_core::RoomCode;

/// Where the session stands with respect to a room.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoomState {
    #[default]
    Idle,
    /// `create_room` sent, waiting for `room_created`.
    Creating,
    /// `join_room` sent, waiting for `joined`.
    Joining(RoomCode),
    Active(RoomCode),
}

impl RoomState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RoomState::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RoomState::Active(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RoomState::Creating | RoomState::Joining(_))
    }
}
