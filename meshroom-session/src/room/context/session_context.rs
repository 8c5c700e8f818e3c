use crate::error::TransportError;
use crate::negotiation::PeerStatus;
use dashmap::DashMap;
use meshroom_core::PeerId;
use std::sync::{Arc, OnceLock};

/// Read-only view of a session, safe to clone and share between tasks.
#[derive(Clone, Default)]
pub struct SessionContext {
    statuses: Arc<DashMap<PeerId, PeerStatus>>,
    self_id: Arc<OnceLock<PeerId>>,
    transport_error: Arc<OnceLock<TransportError>>,
}

impl SessionContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn statuses(&self) -> Arc<DashMap<PeerId, PeerStatus>> {
        self.statuses.clone()
    }

    pub(crate) fn set_self_id(&self, peer_id: PeerId) -> bool {
        self.self_id.set(peer_id).is_ok()
    }

    pub(crate) fn set_transport_error(&self, error: TransportError) {
        let _ = self.transport_error.set(error);
    }

    /// Identity assigned by the server, once connected.
    pub fn self_id(&self) -> Option<&PeerId> {
        self.self_id.get()
    }

    /// Set once the signaling channel has been lost.
    pub fn transport_error(&self) -> Option<&TransportError> {
        self.transport_error.get()
    }

    pub fn peer_status(&self, peer_id: &PeerId) -> Option<PeerStatus> {
        self.statuses.get(peer_id).map(|entry| *entry.value())
    }

    pub fn list_peers(&self) -> Vec<(PeerId, PeerStatus)> {
        let mut peers: Vec<_> = self
            .statuses
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        peers.sort_by(|a, b| a.0.cmp(&b.0));
        peers
    }
}
