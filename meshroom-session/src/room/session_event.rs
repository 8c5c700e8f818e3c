use crate::error::{RoomError, TransportError};
use crate::negotiation::NegotiationState;
use meshroom_core::{PeerId, RoomCode};

/// Observable outcomes of a room session, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The server assigned this session its identity.
    Connected { self_id: PeerId },

    RoomCreated { room_code: RoomCode },

    /// Joined an existing room; `peers` were already present.
    Joined {
        room_code: RoomCode,
        peers: Vec<PeerId>,
    },

    PeerJoined {
        peer_id: PeerId,
        display_name: Option<String>,
    },

    PeerLeft { peer_id: PeerId },

    PeerStateChanged {
        peer_id: PeerId,
        state: NegotiationState,
    },

    /// Negotiation with the peer failed again after the automatic retry.
    PeerUnreachable { peer_id: PeerId },

    RoomError(RoomError),

    /// All peer state for the room was torn down.
    Left { room_code: RoomCode },

    Disconnected(TransportError),
}
