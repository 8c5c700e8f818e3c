mod signaling_config;
mod signaling_event;
mod signaling_output;
mod ws_signaling;

pub use signaling_config::*;
pub use signaling_event::*;
pub use signaling_output::*;
pub use ws_signaling::*;
