use crate::media::LocalTracks;
use crate::negotiation::{EngineContext, EngineHandle, EngineInput, Role, spawn_engine};
use meshroom_core::{PeerId, SignalType};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Peer identity to negotiation engine, at most one engine per peer.
///
/// Owned by a single room session.
pub struct ConnectionRegistry {
    engines: HashMap<PeerId, EngineHandle>,
    ctx: EngineContext,
}

impl ConnectionRegistry {
    pub(crate) fn new(ctx: EngineContext) -> Self {
        Self {
            engines: HashMap::new(),
            ctx,
        }
    }

    /// Tracks attached to every transport created from now on.
    pub fn set_local_tracks(&mut self, tracks: LocalTracks) {
        if tracks.is_empty() {
            warn!("No local tracks; peers will receive no media");
        }
        self.ctx.local_tracks = tracks;
    }

    /// Returns the engine for `peer_id`, spawning one in `role` if none
    /// exists. An existing engine keeps its role.
    pub fn get_or_create(&mut self, peer_id: &PeerId, role: Role) -> &EngineHandle {
        let ctx = &self.ctx;
        self.engines.entry(peer_id.clone()).or_insert_with(|| {
            spawn_engine(peer_id.clone(), role, ctx.clone())
        })
    }

    /// Cancels and discards the engine of `peer_id`. Returns whether one existed.
    pub fn remove(&mut self, peer_id: &PeerId) -> bool {
        let Some(handle) = self.engines.remove(peer_id) else {
            return false;
        };

        let engine_id = handle.engine_id();
        self.ctx
            .statuses
            .remove_if(peer_id, |_, status| status.engine_id == engine_id);
        info!("Engine {} for {:?} destroyed", engine_id, peer_id);
        handle.shutdown();
        true
    }

    pub fn remove_all(&mut self) -> Vec<PeerId> {
        let peers: Vec<PeerId> = self.engines.keys().cloned().collect();
        for peer_id in &peers {
            self.remove(peer_id);
        }
        peers
    }

    /// Hands a relayed descriptor to the engine of `peer_id`.
    pub fn route(
        &self,
        peer_id: &PeerId,
        signal_type: SignalType,
        payload: serde_json::Value,
    ) -> bool {
        let Some(handle) = self.engines.get(peer_id) else {
            debug!("No engine for {:?}, dropping {}", peer_id, signal_type);
            return false;
        };

        debug!("Routing {} from {:?}", signal_type, peer_id);
        handle.send(EngineInput::Signal {
            signal_type,
            payload,
        })
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.engines.contains_key(peer_id)
    }

    pub fn roles(&self) -> Vec<(PeerId, Role)> {
        let mut roles: Vec<_> = self
            .engines
            .iter()
            .map(|(peer_id, handle)| (peer_id.clone(), handle.role()))
            .collect();
        roles.sort_by(|a, b| a.0.cmp(&b.0));
        roles
    }
}
