use std::time::Duration;

/// Tuning for a room session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the queue between session handles and the session.
    pub command_buffer: usize,

    /// After a failed connection is renegotiated, how long to wait for the
    /// peer's offer or answer before reporting it unreachable.
    pub retry_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            retry_timeout: Duration::from_secs(15),
        }
    }
}
