mod engine;
mod engine_task;
mod state;

pub(crate) use engine::*;
pub use engine_task::*;
pub use state::*;
