use std::time::Duration;

pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(25);

#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// WebSocket URL of the signaling server, e.g. `ws://localhost:8000/ws`.
    pub url: String,
    /// Interval between `heartbeat` messages. `None` disables them.
    pub keepalive: Option<Duration>,
    /// Capacity of the inbound event queue.
    pub event_buffer: usize,
}

impl SignalingConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            keepalive: Some(DEFAULT_KEEPALIVE),
            event_buffer: 256,
        }
    }

    pub fn with_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }
}
