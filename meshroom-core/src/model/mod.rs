mod peer;
mod room;
mod signaling;

pub use peer::{PeerId, PeerSummary};
pub use room::{InvalidRoomCode, RoomCode};
pub use signaling::{
    ClientMessage, IceCandidate, IceServerConfig, RoomErrorCode, SdpType, ServerMessage,
    SessionDescription, SignalType,
};
