//! Error taxonomy of the session layer.
//!
//! Transport and local-media errors reach the caller. Protocol errors are
//! logged and dropped. Negotiation errors never leave the engine of the peer
//! they belong to.

use meshroom_core::{InvalidRoomCode, PeerId, RoomErrorCode, SignalType};
use thiserror::Error;

/// Loss of the signaling channel. Every room joined through it is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to connect to signaling server at {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("signaling connection closed: {0}")]
    Closed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalMediaError {
    #[error("permission to capture media was denied")]
    PermissionDenied,

    #[error("no capture devices available")]
    NoDevices,

    #[error("failed to acquire local media: {0}")]
    Other(String),
}

/// Malformed or out-of-place message from the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("malformed {signal_type} payload from {from}: {reason}")]
    BadPayload {
        from: PeerId,
        signal_type: SignalType,
        reason: String,
    },

    #[error("unexpected {kind} message: {reason}")]
    Unexpected { kind: &'static str, reason: String },
}

/// Error reported by the server in an `error` message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("room error {code}: {message}")]
pub struct RoomError {
    pub code: RoomErrorCode,
    pub message: String,
}

impl RoomError {
    pub fn is_session_fatal(&self) -> bool {
        self.code.is_session_fatal()
    }
}

/// Failure of a single description or candidate operation on a peer transport.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("failed to create peer transport: {0}")]
    TransportSetup(String),

    #[error("failed to create {0}: {1}")]
    CreateDescription(&'static str, String),

    #[error("failed to apply local description: {0}")]
    LocalDescription(String),

    #[error("failed to apply remote description: {0}")]
    RemoteDescription(String),

    #[error("failed to add ICE candidate: {0}")]
    Candidate(String),

    #[error("peer connection failed")]
    ConnectionFailed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    LocalMedia(#[from] LocalMediaError),

    #[error("invalid room code: {0}")]
    InvalidRoomCode(#[from] InvalidRoomCode),

    #[error("a room is already active or pending")]
    AlreadyInRoom,

    #[error("session has shut down")]
    SessionClosed,
}
