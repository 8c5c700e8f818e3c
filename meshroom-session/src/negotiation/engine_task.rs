use crate::negotiation::{EngineContext, EngineId, NegotiationEngine, PeerStatus, Role};
use crate::transport::TransportEvent;
use meshroom_core::{PeerId, SignalType};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

/// Input delivered to an engine task.
#[derive(Debug)]
pub enum EngineInput {
    /// Negotiation descriptor relayed by the signaling server.
    Signal {
        signal_type: SignalType,
        payload: serde_json::Value,
    },

    /// Notification from the transport of the given generation.
    Transport {
        generation: u64,
        event: TransportEvent,
    },
}

/// Owner side of a running engine. Dropping it cancels the engine.
#[derive(Debug)]
pub struct EngineHandle {
    engine_id: EngineId,
    role: Role,
    tx: mpsc::UnboundedSender<EngineInput>,
    shutdown: oneshot::Sender<()>,
}

impl EngineHandle {
    pub fn engine_id(&self) -> EngineId {
        self.engine_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns `false` if the engine task has already stopped.
    pub fn send(&self, input: EngineInput) -> bool {
        self.tx.send(input).is_ok()
    }

    /// Cancels whatever the engine is doing and closes its transport.
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
    }
}

/// Registers the engine's status and starts its task.
pub(crate) fn spawn_engine(peer_id: PeerId, role: Role, ctx: EngineContext) -> EngineHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let statuses = ctx.statuses.clone();
    let engine = NegotiationEngine::new(peer_id.clone(), role, ctx, tx.clone());
    let engine_id = engine.engine_id();
    statuses.insert(peer_id.clone(), PeerStatus::new(engine_id, role));

    info!(
        "Engine {} created for {:?} as {}",
        engine_id, peer_id, role
    );
    tokio::spawn(run_engine(engine, rx, shutdown_rx));

    EngineHandle {
        engine_id,
        role,
        tx,
        shutdown: shutdown_tx,
    }
}

async fn run_engine(
    mut engine: NegotiationEngine,
    mut input_rx: mpsc::UnboundedReceiver<EngineInput>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let started = tokio::select! {
        _ = &mut shutdown => false,
        _ = engine.start() => true,
    };

    if started {
        loop {
            let input = tokio::select! {
                _ = &mut shutdown => break,
                _ = wait_until(engine.retry_deadline()) => None,
                input = input_rx.recv() => match input {
                    Some(i) => Some(i),
                    None => break,
                },
            };

            let completed = tokio::select! {
                _ = &mut shutdown => false,
                _ = async {
                    match input {
                        Some(input) => engine.handle(input).await,
                        None => engine.expire_retry().await,
                    }
                } => true,
            };
            if !completed {
                break;
            }
        }
    }

    debug!(
        "Engine {} for {:?} ({}) stopping",
        engine.engine_id(),
        engine.peer_id(),
        engine.role()
    );
    engine.close().await;
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
