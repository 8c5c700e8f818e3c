use crate::error::ProtocolError;
use meshroom_core::ServerMessage;

/// Inbound half of the signaling channel, as seen by the room session.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    Message(ServerMessage),

    /// A frame arrived but could not be decoded.
    Malformed(ProtocolError),

    /// The channel is gone. Nothing follows this event.
    Closed { reason: String },
}
