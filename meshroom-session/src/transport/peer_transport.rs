use crate::error::NegotiationError;
use crate::media::LocalTracks;
use crate::transport::TransportEventSink;
use async_trait::async_trait;
use meshroom_core::{IceCandidate, PeerId, SessionDescription};

/// The media-transport engine behind one peer pair.
///
/// Implementations only execute what they are told; sequencing (offer before
/// answer, no candidates before a remote description) is the engine's job.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn set_local_description(&self, desc: SessionDescription)
    -> Result<(), NegotiationError>;

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    async fn close(&self) -> Result<(), NegotiationError>;
}

/// Creates a fresh transport with the local tracks attached. Called once per
/// engine and once more per renegotiation.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    async fn create(
        &self,
        peer_id: &PeerId,
        tracks: &LocalTracks,
        events: TransportEventSink,
    ) -> Result<Box<dyn PeerTransport>, NegotiationError>;
}
