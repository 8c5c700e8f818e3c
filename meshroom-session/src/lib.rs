//! Signaling session and peer-connection orchestration for a full-mesh room.
//!
//! A [`RoomSession`] consumes the signaling server's event stream, keeps the
//! room roster and runs one negotiation engine per remote peer.

pub mod error;
pub mod media;
pub mod negotiation;
pub mod registry;
pub mod room;
pub mod signaling;
pub mod transport;

pub use error::*;
pub use media::*;
pub use negotiation::{EngineHandle, EngineId, EngineInput, NegotiationState, PeerStatus, Role};
pub use registry::ConnectionRegistry;
pub use room::*;
pub use signaling::*;
pub use transport::*;
