use crate::media::RemoteTrack;
use crate::negotiation::EngineInput;
use meshroom_core::IceCandidate;
use tokio::sync::mpsc;

/// Connection state reported by the underlying peer transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events a peer transport produces for the engine that owns it.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local candidate was gathered and must be sent to the remote peer.
    CandidateGenerated(IceCandidate),

    StateChanged(PeerConnectionState),

    /// The remote peer started sending a track.
    TrackAdded(RemoteTrack),
}

/// Handle a transport uses to report events back to its engine.
///
/// Each sink is stamped with the transport generation it was created for, so
/// events from a transport that has since been replaced are recognised and
/// dropped by the engine.
#[derive(Debug, Clone)]
pub struct TransportEventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<EngineInput>,
}

impl TransportEventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<EngineInput>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once the owning engine is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx
            .send(EngineInput::Transport {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}
