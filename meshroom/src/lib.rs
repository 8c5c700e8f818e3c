//! Full-mesh room signaling and peer negotiation.
//!
//! The wire model is always available. Enable `session` for the room session
//! and negotiation engines.

pub use meshroom_core::{PeerId, RoomCode};

pub mod model {
    pub use meshroom_core::model::*;
    pub use meshroom_core::utils;
}

#[cfg(feature = "session")]
pub mod session {
    pub use meshroom_session::*;
}
