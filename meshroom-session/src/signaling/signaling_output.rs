use async_trait::async_trait;
use meshroom_core::{ClientMessage, PeerId, SignalType};

/// Outbound half of the signaling channel.
///
/// Sends are best effort: an implementation logs a failed send and returns.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send(&self, message: ClientMessage);

    /// Forward a negotiation descriptor to one peer in the room.
    async fn send_signal(&self, to: PeerId, signal_type: SignalType, payload: serde_json::Value) {
        self.send(ClientMessage::Signal {
            to,
            signal_type,
            payload,
        })
        .await;
    }
}
