use crate::error::{NegotiationError, ProtocolError};
use crate::media::{LocalTracks, RemoteTrack, RenderSink};
use crate::negotiation::{EngineId, EngineInput, NegotiationState, PeerStatus, Role};
use crate::room::SessionEvent;
use crate::signaling::SignalingOutput;
use crate::transport::{
    PeerConnectionState, PeerTransport, TransportEvent, TransportEventSink, TransportFactory,
};
use dashmap::DashMap;
use meshroom_core::{IceCandidate, PeerId, SdpType, SessionDescription, SignalType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Everything an engine needs from the session that owns it.
#[derive(Clone)]
pub(crate) struct EngineContext {
    pub signaling: Arc<dyn SignalingOutput>,
    pub transports: Arc<dyn TransportFactory>,
    pub render: Arc<dyn RenderSink>,
    pub local_tracks: LocalTracks,
    pub statuses: Arc<DashMap<PeerId, PeerStatus>>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    /// How long a renegotiated engine waits for the remote description.
    pub retry_timeout: Duration,
}

/// Negotiation state machine for one remote peer.
///
/// All methods run on the engine's own task, so transitions for a peer are
/// applied one at a time.
pub(crate) struct NegotiationEngine {
    peer_id: PeerId,
    engine_id: EngineId,
    role: Role,
    state: NegotiationState,
    local_description_set: bool,
    remote_description_set: bool,
    pending_remote_candidates: VecDeque<IceCandidate>,
    transport_generation: u64,
    renegotiation_attempted: bool,
    retry_deadline: Option<Instant>,
    remote_tracks: Vec<RemoteTrack>,
    transport: Option<Box<dyn PeerTransport>>,
    input_tx: mpsc::UnboundedSender<EngineInput>,
    ctx: EngineContext,
}

impl NegotiationEngine {
    pub fn new(
        peer_id: PeerId,
        role: Role,
        ctx: EngineContext,
        input_tx: mpsc::UnboundedSender<EngineInput>,
    ) -> Self {
        Self {
            peer_id,
            engine_id: EngineId::new(),
            role,
            state: NegotiationState::Init,
            local_description_set: false,
            remote_description_set: false,
            pending_remote_candidates: VecDeque::new(),
            transport_generation: 0,
            renegotiation_attempted: false,
            retry_deadline: None,
            remote_tracks: Vec::new(),
            transport: None,
            input_tx,
            ctx,
        }
    }

    pub fn engine_id(&self) -> EngineId {
        self.engine_id
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Set while a renegotiated engine waits for the remote description.
    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry_deadline
    }

    /// Creates the transport and runs the role path. Failures go through the
    /// same recovery as any other negotiation error.
    pub async fn start(&mut self) {
        if let Err(e) = self.open().await {
            self.fail(e).await;
        }
    }

    pub async fn handle(&mut self, input: EngineInput) {
        let result = match input {
            EngineInput::Signal {
                signal_type,
                payload,
            } => self.handle_signal(signal_type, payload).await,
            EngineInput::Transport { generation, event } => {
                if generation != self.transport_generation {
                    debug!(
                        "Dropping event from stale transport {} of {:?}",
                        generation, self.peer_id
                    );
                    return;
                }
                self.handle_transport_event(event).await
            }
        };

        if let Err(e) = result {
            self.fail(e).await;
        }
    }

    /// Terminal teardown. Closes the transport; the engine is never reused.
    pub async fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                debug!("Error closing transport for {:?}: {}", self.peer_id, e);
            }
        }
        self.set_state(NegotiationState::Closed).await;
        self.ctx
            .render
            .detach_remote_output(self.peer_id.clone())
            .await;
        info!("Engine {} for {:?} closed", self.engine_id, self.peer_id);
    }

    async fn open(&mut self) -> Result<(), NegotiationError> {
        let sink = TransportEventSink::new(self.transport_generation, self.input_tx.clone());
        let transport = self
            .ctx
            .transports
            .create(&self.peer_id, &self.ctx.local_tracks, sink)
            .await?;
        self.transport = Some(transport);

        match self.role {
            Role::Offerer => self.send_offer().await,
            Role::Answerer => {
                self.set_state(NegotiationState::AwaitingOffer).await;
                Ok(())
            }
        }
    }

    async fn send_offer(&mut self) -> Result<(), NegotiationError> {
        let transport = self.transport()?;
        let offer = transport.create_offer().await?;
        transport.set_local_description(offer.clone()).await?;
        self.local_description_set = true;
        self.set_state(NegotiationState::OfferSent).await;
        self.emit_signal(SignalType::Offer, &offer).await
    }

    async fn handle_signal(
        &mut self,
        signal_type: SignalType,
        payload: serde_json::Value,
    ) -> Result<(), NegotiationError> {
        if self.state.is_terminal() {
            debug!(
                "Ignoring {} from {:?} in state {}",
                signal_type, self.peer_id, self.state
            );
            return Ok(());
        }

        match signal_type {
            SignalType::Offer => {
                let Some(offer) = self.decode::<SessionDescription>(signal_type, payload) else {
                    return Ok(());
                };
                self.on_remote_offer(offer).await
            }
            SignalType::Answer => {
                let Some(answer) = self.decode::<SessionDescription>(signal_type, payload) else {
                    return Ok(());
                };
                self.on_remote_answer(answer).await
            }
            SignalType::Candidate => {
                let Some(candidate) = self.decode::<IceCandidate>(signal_type, payload) else {
                    return Ok(());
                };
                self.on_remote_candidate(candidate).await
            }
        }
    }

    async fn on_remote_offer(&mut self, offer: SessionDescription) -> Result<(), NegotiationError> {
        if offer.sdp_type != SdpType::Offer {
            warn!(
                "Offer signal from {:?} carries a {:?} description",
                self.peer_id, offer.sdp_type
            );
            return Ok(());
        }

        if self.state == NegotiationState::OfferSent && self.local_description_set {
            warn!(
                "Discarding offer from {:?}: our own offer is still pending",
                self.peer_id
            );
            return Ok(());
        }

        let transport = self.transport()?;
        transport.set_remote_description(offer).await?;
        self.remote_description_set = true;
        self.retry_deadline = None;
        self.flush_pending_candidates().await?;

        let transport = self.transport()?;
        let answer = transport.create_answer().await?;
        transport.set_local_description(answer.clone()).await?;
        self.local_description_set = true;

        // A re-offer on a live connection keeps the connection state.
        if !matches!(
            self.state,
            NegotiationState::Connected | NegotiationState::Disconnected
        ) {
            self.set_state(NegotiationState::RemoteDescriptionSet).await;
        }

        self.emit_signal(SignalType::Answer, &answer).await
    }

    async fn on_remote_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        if self.state != NegotiationState::OfferSent {
            warn!(
                "Ignoring answer from {:?} in state {}",
                self.peer_id, self.state
            );
            return Ok(());
        }

        self.transport()?.set_remote_description(answer).await?;
        self.remote_description_set = true;
        self.retry_deadline = None;
        self.flush_pending_candidates().await?;
        self.set_state(NegotiationState::RemoteDescriptionSet).await;
        Ok(())
    }

    async fn on_remote_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        if !self.remote_description_set {
            debug!(
                "Queueing candidate from {:?} until the remote description is set",
                self.peer_id
            );
            self.pending_remote_candidates.push_back(candidate);
            return Ok(());
        }

        self.transport()?.add_ice_candidate(candidate).await
    }

    async fn flush_pending_candidates(&mut self) -> Result<(), NegotiationError> {
        if !self.pending_remote_candidates.is_empty() {
            debug!(
                "Applying {} queued candidates from {:?}",
                self.pending_remote_candidates.len(),
                self.peer_id
            );
        }

        while let Some(candidate) = self.pending_remote_candidates.pop_front() {
            self.transport()?.add_ice_candidate(candidate).await?;
        }
        Ok(())
    }

    async fn handle_transport_event(
        &mut self,
        event: TransportEvent,
    ) -> Result<(), NegotiationError> {
        match event {
            TransportEvent::CandidateGenerated(candidate) => {
                if self.state.is_terminal() {
                    return Ok(());
                }
                self.emit_signal(SignalType::Candidate, &candidate).await
            }

            TransportEvent::StateChanged(state) => self.on_connection_state(state).await,

            TransportEvent::TrackAdded(track) => {
                debug!(
                    "Remote {:?} track '{}' from {:?}",
                    track.kind, track.id, self.peer_id
                );
                self.remote_tracks.push(track);
                self.ctx
                    .render
                    .attach_remote_output(self.peer_id.clone(), self.remote_tracks.clone())
                    .await;
                Ok(())
            }
        }
    }

    async fn on_connection_state(
        &mut self,
        state: PeerConnectionState,
    ) -> Result<(), NegotiationError> {
        if self.state.is_terminal() {
            return Ok(());
        }

        match state {
            PeerConnectionState::Connected if self.remote_description_set => {
                self.set_state(NegotiationState::Connected).await;
            }
            PeerConnectionState::Disconnected if self.state == NegotiationState::Connected => {
                self.set_state(NegotiationState::Disconnected).await;
            }
            PeerConnectionState::Failed => return Err(NegotiationError::ConnectionFailed),
            other => debug!("Transport of {:?} is {:?}", self.peer_id, other),
        }
        Ok(())
    }

    /// Recovery for any negotiation error: one fresh transport, then give up.
    async fn fail(&mut self, error: NegotiationError) {
        if self.state.is_terminal() {
            return;
        }

        warn!("Negotiation with {:?} failed: {}", self.peer_id, error);

        if self.renegotiation_attempted {
            self.give_up().await;
            return;
        }

        self.renegotiation_attempted = true;
        info!(
            "Renegotiating with {:?} on a new transport as {}",
            self.peer_id, self.role
        );

        if let Some(old) = self.transport.take() {
            if let Err(e) = old.close().await {
                debug!("Error closing failed transport of {:?}: {}", self.peer_id, e);
            }
        }

        self.transport_generation += 1;
        self.local_description_set = false;
        self.remote_description_set = false;
        self.pending_remote_candidates.clear();
        self.remote_tracks.clear();
        self.set_state(NegotiationState::Init).await;

        if let Err(e) = self.open().await {
            warn!("Renegotiation with {:?} failed: {}", self.peer_id, e);
            self.give_up().await;
            return;
        }
        self.retry_deadline = Some(Instant::now() + self.ctx.retry_timeout);
    }

    /// The renegotiated pair did not progress in time.
    pub async fn expire_retry(&mut self) {
        self.retry_deadline = None;
        if self.state.is_terminal() || self.remote_description_set {
            return;
        }

        let expected = match self.role {
            Role::Offerer => "answer",
            Role::Answerer => "offer",
        };
        warn!(
            "No {} from {:?} after renegotiating, giving up",
            expected, self.peer_id
        );
        self.give_up().await;
    }

    async fn give_up(&mut self) {
        self.retry_deadline = None;
        self.set_state(NegotiationState::Failed).await;
        warn!("Peer {:?} is unreachable", self.peer_id);
        let _ = self.ctx.events.send(SessionEvent::PeerUnreachable {
            peer_id: self.peer_id.clone(),
        });
    }

    async fn set_state(&mut self, state: NegotiationState) {
        if self.state == state {
            return;
        }

        info!(
            "Peer {:?} ({}): {} -> {}",
            self.peer_id, self.role, self.state, state
        );
        self.state = state;

        if let Some(mut status) = self.ctx.statuses.get_mut(&self.peer_id) {
            if status.engine_id == self.engine_id {
                status.state = state;
            }
        }

        self.ctx
            .render
            .on_peer_state(self.peer_id.clone(), state)
            .await;
        let _ = self.ctx.events.send(SessionEvent::PeerStateChanged {
            peer_id: self.peer_id.clone(),
            state,
        });
    }

    async fn emit_signal<P: Serialize>(
        &self,
        signal_type: SignalType,
        payload: &P,
    ) -> Result<(), NegotiationError> {
        let payload = serde_json::to_value(payload).map_err(anyhow::Error::from)?;
        debug!("Sending {} to {:?}", signal_type, self.peer_id);
        self.ctx
            .signaling
            .send_signal(self.peer_id.clone(), signal_type, payload)
            .await;
        Ok(())
    }

    fn decode<T: DeserializeOwned>(
        &self,
        signal_type: SignalType,
        payload: serde_json::Value,
    ) -> Option<T> {
        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = ProtocolError::BadPayload {
                    from: self.peer_id.clone(),
                    signal_type,
                    reason: e.to_string(),
                };
                warn!("{}", err);
                None
            }
        }
    }

    fn transport(&self) -> Result<&dyn PeerTransport, NegotiationError> {
        self.transport
            .as_deref()
            .ok_or_else(|| NegotiationError::TransportSetup("no transport".to_string()))
    }
}
