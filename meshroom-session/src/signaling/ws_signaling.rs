use crate::error::{ProtocolError, TransportError};
use crate::signaling::{SignalingConfig, SignalingEvent, SignalingOutput};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshroom_core::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, interval_at};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};

/// Client side of the signaling WebSocket.
///
/// Cloning is cheap; all clones feed the same writer task.
#[derive(Debug, Clone)]
pub struct WsSignaling {
    outbound: mpsc::UnboundedSender<Message>,
}

impl WsSignaling {
    /// Connects to the server and spawns the socket tasks.
    ///
    /// The returned receiver yields decoded server messages and ends with a
    /// single [`SignalingEvent::Closed`].
    pub async fn connect(
        config: &SignalingConfig,
    ) -> Result<(Self, mpsc::Receiver<SignalingEvent>), TransportError> {
        let (socket, _) =
            connect_async(config.url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    url: config.url.clone(),
                    reason: e.to_string(),
                })?;

        info!("Connected to signaling server at {}", config.url);

        let (mut sender, mut receiver) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let keepalive = config.keepalive;

        let mut send_task = tokio::spawn(async move {
            let mut heartbeat = keepalive.map(heartbeat_interval);

            loop {
                let msg = tokio::select! {
                    msg = rx.recv() => match msg {
                        Some(m) => m,
                        None => break,
                    },
                    _ = tick(&mut heartbeat) => match ClientMessage::Heartbeat.to_json() {
                        Ok(json) => Message::Text(json),
                        Err(e) => {
                            error!("Failed to serialize heartbeat: {}", e);
                            continue;
                        }
                    },
                };

                if let Err(e) = sender.send(msg).await {
                    return format!("send failed: {e}");
                }
            }

            let _ = sender.close().await;
            "all signaling handles dropped".to_string()
        });

        let inbound_tx = event_tx.clone();
        let mut recv_task = tokio::spawn(async move {
            while let Some(frame) = receiver.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(frame)) => {
                        return frame
                            .map(|f| format!("closed by server: {}", f.reason))
                            .unwrap_or_else(|| "closed by server".to_string());
                    }
                    Ok(_) => continue,
                    Err(e) => return e.to_string(),
                };

                let event = match ServerMessage::from_json(&text) {
                    Ok(msg) if msg.is_ignorable() => {
                        trace!("Received {}", msg.kind());
                        continue;
                    }
                    Ok(msg) => {
                        debug!("Received {} message", msg.kind());
                        SignalingEvent::Message(msg)
                    }
                    Err(e) => SignalingEvent::Malformed(ProtocolError::Malformed(e.to_string())),
                };

                if inbound_tx.send(event).await.is_err() {
                    return "session dropped the event stream".to_string();
                }
            }

            "connection ended".to_string()
        });

        tokio::spawn(async move {
            let reason = tokio::select! {
                res = &mut send_task => {
                    recv_task.abort();
                    res.unwrap_or_else(|e| e.to_string())
                }
                res = &mut recv_task => {
                    send_task.abort();
                    res.unwrap_or_else(|e| e.to_string())
                }
            };

            warn!("Signaling connection closed: {}", reason);
            let _ = event_tx.send(SignalingEvent::Closed { reason }).await;
        });

        Ok((Self { outbound: tx }, event_rx))
    }
}

#[async_trait]
impl SignalingOutput for WsSignaling {
    async fn send(&self, message: ClientMessage) {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize client message: {}", e);
                return;
            }
        };

        if self.outbound.send(Message::Text(json)).is_err() {
            warn!("Dropped outgoing message: signaling connection is closed");
        }
    }
}

fn heartbeat_interval(period: Duration) -> Interval {
    interval_at(Instant::now() + period, period)
}

async fn tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
