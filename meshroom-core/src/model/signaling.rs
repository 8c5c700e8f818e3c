use crate::model::peer::{PeerId, PeerSummary};
use crate::model::room::RoomCode;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Kind of negotiation descriptor carried by a `signal` message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Offer,
    Answer,
    Candidate,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalType::Offer => "offer",
            SignalType::Answer => "answer",
            SignalType::Candidate => "candidate",
        };
        f.write_str(s)
    }
}

/// Error codes sent by the signaling server in `error` messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoomErrorCode {
    RoomNotFound,
    RoomExpired,
    RoomClosed,
    RoomFull,
    Other(String),
}

impl RoomErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            RoomErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            RoomErrorCode::RoomExpired => "ROOM_EXPIRED",
            RoomErrorCode::RoomClosed => "ROOM_CLOSED",
            RoomErrorCode::RoomFull => "ROOM_FULL",
            RoomErrorCode::Other(code) => code,
        }
    }

    /// Codes after which the room can no longer be used and the session must
    /// tear down all peer state.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            RoomErrorCode::RoomNotFound | RoomErrorCode::RoomExpired | RoomErrorCode::RoomClosed
        )
    }
}

impl From<String> for RoomErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "ROOM_NOT_FOUND" => RoomErrorCode::RoomNotFound,
            "ROOM_EXPIRED" => RoomErrorCode::RoomExpired,
            "ROOM_CLOSED" => RoomErrorCode::RoomClosed,
            "ROOM_FULL" => RoomErrorCode::RoomFull,
            _ => RoomErrorCode::Other(code),
        }
    }
}

impl From<&str> for RoomErrorCode {
    fn from(code: &str) -> Self {
        RoomErrorCode::from(code.to_owned())
    }
}

impl From<RoomErrorCode> for String {
    fn from(code: RoomErrorCode) -> Self {
        match code {
            RoomErrorCode::Other(code) => code,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for RoomErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages received from the signaling server.
///
/// Envelope is `{"type": ..., "payload": {...}}`. Optional fields are extras
/// the server may include; the session does not depend on them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        socket_id: PeerId,
    },
    RoomCreated {
        room_code: RoomCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        your_socket_id: Option<PeerId>,
    },
    Joined {
        room_code: RoomCode,
        #[serde(default)]
        peers: Vec<PeerSummary>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        your_socket_id: Option<PeerId>,
    },
    PeerJoined {
        socket_id: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    PeerLeft {
        socket_id: PeerId,
    },
    Signal {
        from: PeerId,
        signal_type: SignalType,
        payload: serde_json::Value,
    },
    Error {
        code: RoomErrorCode,
        #[serde(default)]
        message: String,
    },
    Pong,
    /// Room chat broadcast. Carried by the server but not used by sessions.
    ChatMessage(serde_json::Value),
}

impl ServerMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Wire name of the message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::RoomCreated { .. } => "room_created",
            ServerMessage::Joined { .. } => "joined",
            ServerMessage::PeerJoined { .. } => "peer_joined",
            ServerMessage::PeerLeft { .. } => "peer_left",
            ServerMessage::Signal { .. } => "signal",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Pong => "pong",
            ServerMessage::ChatMessage(_) => "chat_message",
        }
    }

    /// Frames that carry nothing for the room session.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, ServerMessage::Pong | ServerMessage::ChatMessage(_))
    }
}

/// Messages sent to the signaling server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        display_name: String,
        ttl_hours: u32,
        max_participants: u32,
    },
    JoinRoom {
        room_code: RoomCode,
        display_name: String,
    },
    Signal {
        to: PeerId,
        signal_type: SignalType,
        payload: serde_json::Value,
    },
    LeaveRoom {},
    Heartbeat,
}

impl ClientMessage {
    /// Build a `signal` message from any serializable descriptor.
    pub fn signal<P: Serialize>(
        to: PeerId,
        signal_type: SignalType,
        payload: &P,
    ) -> Result<Self, serde_json::Error> {
        Ok(ClientMessage::Signal {
            to,
            signal_type,
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Pranswer,
    Answer,
    Rollback,
}

/// Session description in the shape browsers produce with `toJSON()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// A single network path candidate, browser `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}
