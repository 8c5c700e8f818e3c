use std::fmt;
use uuid::Uuid;

/// Which side of a peer pair sends the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Offerer,
    Answerer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Offerer => f.write_str("offerer"),
            Role::Answerer => f.write_str("answerer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Init,
    OfferSent,
    AwaitingOffer,
    RemoteDescriptionSet,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl NegotiationState {
    /// States in which the engine no longer reacts to remote input.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NegotiationState::Failed | NegotiationState::Closed)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NegotiationState::Init => "init",
            NegotiationState::OfferSent => "offer-sent",
            NegotiationState::AwaitingOffer => "awaiting-offer",
            NegotiationState::RemoteDescriptionSet => "remote-description-set",
            NegotiationState::Connected => "connected",
            NegotiationState::Disconnected => "disconnected",
            NegotiationState::Failed => "failed",
            NegotiationState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Identity of one engine instance. A peer that leaves and comes back gets a
/// new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(Uuid);

impl EngineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Last reported state of the engine serving a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerStatus {
    pub engine_id: EngineId,
    pub role: Role,
    pub state: NegotiationState,
}

impl PeerStatus {
    pub fn new(engine_id: EngineId, role: Role) -> Self {
        Self {
            engine_id,
            role,
            state: NegotiationState::Init,
        }
    }
}
