use crate::error::{ProtocolError, RoomError, SessionError, TransportError};
use crate::media::{LocalMediaSource, LocalTracks, RenderSink};
use crate::negotiation::{EngineContext, Role};
use crate::registry::ConnectionRegistry;
use crate::room::{
    RoomCommand, RoomState, SessionConfig, SessionContext, SessionEvent, SessionHandle,
    SessionSnapshot,
};
use crate::signaling::{SignalingConfig, SignalingEvent, SignalingOutput, WsSignaling};
use crate::transport::TransportFactory;
use meshroom_core::{ClientMessage, PeerId, PeerSummary, RoomCode, RoomErrorCode, ServerMessage};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// External collaborators a session drives.
#[derive(Clone)]
pub struct SessionCollaborators {
    pub transports: Arc<dyn TransportFactory>,
    pub media: Arc<dyn LocalMediaSource>,
    pub render: Arc<dyn RenderSink>,
}

/// A session together with its handle and outcome stream.
pub type SessionParts = (
    RoomSession,
    SessionHandle,
    mpsc::UnboundedReceiver<SessionEvent>,
);

/// Room membership of one signaling connection.
///
/// Commands from [`SessionHandle`]s and server messages are processed one at a
/// time by [`RoomSession::run`].
pub struct RoomSession {
    self_id: Option<PeerId>,
    room: RoomState,
    roster: BTreeSet<PeerId>,
    registry: ConnectionRegistry,
    signaling: Arc<dyn SignalingOutput>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling_rx: mpsc::Receiver<SignalingEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
    context: SessionContext,
}

impl RoomSession {
    pub fn new(
        config: &SessionConfig,
        signaling: Arc<dyn SignalingOutput>,
        signaling_rx: mpsc::Receiver<SignalingEvent>,
        collaborators: SessionCollaborators,
    ) -> SessionParts {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let context = SessionContext::new();

        let registry = ConnectionRegistry::new(EngineContext {
            signaling: signaling.clone(),
            transports: collaborators.transports,
            render: collaborators.render,
            local_tracks: LocalTracks::default(),
            statuses: context.statuses(),
            events: events_tx.clone(),
            retry_timeout: config.retry_timeout,
        });

        let session = Self {
            self_id: None,
            room: RoomState::Idle,
            roster: BTreeSet::new(),
            registry,
            signaling,
            command_rx,
            signaling_rx,
            events: events_tx,
            context: context.clone(),
        };
        let handle = SessionHandle::new(command_tx, collaborators.media, context);

        (session, handle, events_rx)
    }

    /// Opens the signaling WebSocket and builds a session on top of it.
    pub async fn connect(
        signaling_config: &SignalingConfig,
        config: &SessionConfig,
        collaborators: SessionCollaborators,
    ) -> Result<SessionParts, TransportError> {
        let (signaling, signaling_rx) = WsSignaling::connect(signaling_config).await?;
        Ok(Self::new(
            config,
            Arc::new(signaling),
            signaling_rx,
            collaborators,
        ))
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Runs until every handle is dropped or the signaling channel is lost.
    ///
    /// Loss of the channel is returned as [`SessionError::Transport`].
    pub async fn run(mut self) -> Result<(), SessionError> {
        info!("Room session started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All session handles dropped. Shutting down session.");
                            break;
                        }
                    }
                }

                evt = self.signaling_rx.recv() => {
                    match evt {
                        Some(SignalingEvent::Message(msg)) => self.handle_server_message(msg).await,
                        Some(SignalingEvent::Malformed(e)) => {
                            warn!("Ignoring malformed server message: {}", e);
                        }
                        Some(SignalingEvent::Closed { reason }) => {
                            return Err(self.on_transport_lost(reason));
                        }
                        None => {
                            return Err(
                                self.on_transport_lost("signaling channel ended".to_string())
                            );
                        }
                    }
                }
            }
        }

        if !self.room.is_idle() {
            self.signaling.send(ClientMessage::LeaveRoom {}).await;
            self.teardown_room();
        }

        info!("Room session finished");
        Ok(())
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::CreateRoom {
                display_name,
                ttl_hours,
                max_participants,
                tracks,
                reply,
            } => {
                let result = self
                    .create_room(display_name, ttl_hours, max_participants, tracks)
                    .await;
                let _ = reply.send(result);
            }

            RoomCommand::JoinRoom {
                room_code,
                display_name,
                tracks,
                reply,
            } => {
                let result = self.join_room(room_code, display_name, tracks).await;
                let _ = reply.send(result);
            }

            RoomCommand::LeaveRoom { reply } => {
                self.leave_room().await;
                let _ = reply.send(Ok(()));
            }

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(Ok(self.snapshot()));
            }
        }
    }

    async fn create_room(
        &mut self,
        display_name: String,
        ttl_hours: u32,
        max_participants: u32,
        tracks: LocalTracks,
    ) -> Result<(), SessionError> {
        if !self.room.is_idle() {
            return Err(SessionError::AlreadyInRoom);
        }

        info!("Creating room as '{}'", display_name);
        self.registry.set_local_tracks(tracks);
        self.signaling
            .send(ClientMessage::CreateRoom {
                display_name,
                ttl_hours,
                max_participants,
            })
            .await;
        self.room = RoomState::Creating;
        Ok(())
    }

    async fn join_room(
        &mut self,
        room_code: RoomCode,
        display_name: String,
        tracks: LocalTracks,
    ) -> Result<(), SessionError> {
        if !self.room.is_idle() {
            return Err(SessionError::AlreadyInRoom);
        }

        info!("Joining room {} as '{}'", room_code, display_name);
        self.registry.set_local_tracks(tracks);
        self.signaling
            .send(ClientMessage::JoinRoom {
                room_code: room_code.clone(),
                display_name,
            })
            .await;
        self.room = RoomState::Joining(room_code);
        Ok(())
    }

    async fn leave_room(&mut self) {
        if self.room.is_idle() {
            debug!("Leave requested outside a room");
            return;
        }

        self.signaling.send(ClientMessage::LeaveRoom {}).await;
        self.teardown_room();
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            self_id: self.self_id.clone(),
            room: self.room.clone(),
            roster: self.roster.iter().cloned().collect(),
            engines: self.registry.roles(),
        }
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Connected { socket_id } => self.on_connected(socket_id),

            ServerMessage::RoomCreated { room_code, .. } => {
                if self.room != RoomState::Creating {
                    unexpected("room_created", "no room creation is pending");
                    return;
                }

                info!("Room {} created", room_code);
                self.roster.clear();
                self.room = RoomState::Active(room_code.clone());
                let _ = self.events.send(SessionEvent::RoomCreated { room_code });
            }

            ServerMessage::Joined {
                room_code, peers, ..
            } => self.on_joined(room_code, peers),

            ServerMessage::PeerJoined {
                socket_id,
                display_name,
            } => self.on_peer_joined(socket_id, display_name),

            ServerMessage::PeerLeft { socket_id } => self.on_peer_left(&socket_id),

            ServerMessage::Signal {
                from,
                signal_type,
                payload,
            } => {
                if !self.room.is_active() {
                    unexpected("signal", "not in an active room");
                    return;
                }
                if self.is_self(&from) {
                    unexpected("signal", "sender is this session");
                    return;
                }

                if !self.registry.contains(&from) {
                    self.roster.insert(from.clone());
                    let engine = self.registry.get_or_create(&from, Role::Answerer);
                    info!(
                        "First signal from unknown peer {:?}, engine {} as {}",
                        from,
                        engine.engine_id(),
                        engine.role()
                    );
                }
                self.registry.route(&from, signal_type, payload);
            }

            ServerMessage::Error { code, message } => self.on_room_error(code, message),

            ignored @ (ServerMessage::Pong | ServerMessage::ChatMessage(_)) => {
                debug!("Ignoring {} message", ignored.kind())
            }
        }
    }

    fn on_connected(&mut self, socket_id: PeerId) {
        if let Some(current) = &self.self_id {
            warn!(
                "Ignoring second connected message ({:?}), already {:?}",
                socket_id, current
            );
            return;
        }

        info!("Connected to signaling server as {:?}", socket_id);
        self.context.set_self_id(socket_id.clone());
        self.self_id = Some(socket_id.clone());
        let _ = self
            .events
            .send(SessionEvent::Connected { self_id: socket_id });
    }

    fn on_joined(&mut self, room_code: RoomCode, peers: Vec<PeerSummary>) {
        if !matches!(self.room, RoomState::Joining(_)) {
            unexpected("joined", "no join is pending");
            return;
        }

        info!("Joined room {} with {} peers", room_code, peers.len());
        self.roster.clear();
        self.room = RoomState::Active(room_code.clone());

        let mut present = Vec::with_capacity(peers.len());
        for peer in peers {
            if self.is_self(&peer.socket_id) {
                continue;
            }
            self.roster.insert(peer.socket_id.clone());
            let engine = self.registry.get_or_create(&peer.socket_id, Role::Answerer);
            debug!(
                "Awaiting offer from {:?} on engine {}",
                peer.socket_id,
                engine.engine_id()
            );
            present.push(peer.socket_id);
        }

        let _ = self.events.send(SessionEvent::Joined {
            room_code,
            peers: present,
        });
    }

    fn on_peer_joined(&mut self, peer_id: PeerId, display_name: Option<String>) {
        if !self.room.is_active() {
            unexpected("peer_joined", "not in an active room");
            return;
        }
        if self.is_self(&peer_id) {
            return;
        }

        self.roster.insert(peer_id.clone());
        let engine = self.registry.get_or_create(&peer_id, Role::Offerer);
        info!(
            "Peer {:?} ({}) joined, engine {} offers",
            peer_id,
            display_name.as_deref().unwrap_or("unnamed"),
            engine.engine_id()
        );
        let _ = self.events.send(SessionEvent::PeerJoined {
            peer_id,
            display_name,
        });
    }

    fn on_peer_left(&mut self, peer_id: &PeerId) {
        let in_roster = self.roster.remove(peer_id);
        let had_engine = self.registry.remove(peer_id);

        if !in_roster && !had_engine {
            debug!("peer_left for unknown peer {:?}", peer_id);
            return;
        }

        info!("Peer {:?} left", peer_id);
        let _ = self.events.send(SessionEvent::PeerLeft {
            peer_id: peer_id.clone(),
        });
    }

    fn on_room_error(&mut self, code: RoomErrorCode, message: String) {
        let err = RoomError { code, message };
        let _ = self.events.send(SessionEvent::RoomError(err.clone()));

        if err.is_session_fatal() {
            warn!("Room is no longer usable: {}", err);
            self.teardown_room();
            return;
        }

        warn!("Server reported {}", err);
        if self.room.is_pending() {
            self.room = RoomState::Idle;
        }
    }

    fn on_transport_lost(&mut self, reason: String) -> SessionError {
        let err = TransportError::Closed(reason);
        error!("Signaling transport lost: {}", err);

        self.context.set_transport_error(err.clone());
        self.teardown_room();
        let _ = self.events.send(SessionEvent::Disconnected(err.clone()));

        SessionError::Transport(err)
    }

    /// Destroys every engine and forgets the room. Each engine detaches its
    /// own output as it closes.
    fn teardown_room(&mut self) {
        let room = std::mem::take(&mut self.room);
        let peers = self.registry.remove_all();
        self.roster.clear();
        debug!("Destroyed {} engines", peers.len());

        if let RoomState::Active(room_code) = room {
            info!("Left room {}", room_code);
            let _ = self.events.send(SessionEvent::Left { room_code });
        }
    }

    fn is_self(&self, peer_id: &PeerId) -> bool {
        self.self_id.as_ref() == Some(peer_id)
    }
}

fn unexpected(kind: &'static str, reason: &str) {
    let err = ProtocolError::Unexpected {
        kind,
        reason: reason.to_string(),
    };
    warn!("{}", err);
}
