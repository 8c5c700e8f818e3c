mod context;
mod room_command;
mod room_session;
mod room_state;
mod session_config;
mod session_event;
mod session_handle;

pub use context::*;
pub use room_command::*;
pub use room_session::*;
pub use room_state::*;
pub use session_config::*;
pub use session_event::*;
pub use session_handle::*;
