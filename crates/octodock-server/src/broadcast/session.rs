//! Per-connection socket loop.

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::registry::{ConnectionId, Frame, Outbound};
use super::server::BroadcastServer;

impl From<Frame> for Message {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Text(text) => Self::Text(text.into()),
            Frame::Binary(data) => Self::Binary(data),
        }
    }
}

/// Drive one upgraded socket until the peer leaves or the server evicts it.
///
/// Inbound text and binary frames are relayed to every other open
/// connection. Outbound frames come from this connection's queue, so one
/// slow peer never blocks the sender or the other peers.
pub async fn serve_socket(server: BroadcastServer, mut socket: WebSocket) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = server.registry().clone();
    let id = registry.register(tx).await;

    if server.is_closed() {
        registry.unregister(id).await;
        return;
    }
    registry.mark_open(id).await;
    info!(connection_id = id, "WebSocket connection opened");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let message = match outbound {
                    Some(Outbound::Frame(frame)) => Message::from(frame),
                    Some(Outbound::Ping) => Message::Ping(Bytes::new()),
                    Some(Outbound::Terminate) | None => {
                        debug!(connection_id = id, "Dropping socket");
                        break;
                    }
                };
                if let Err(e) = socket.send(message).await {
                    debug!(connection_id = id, error = %e, "Send failed");
                    break;
                }
            }
            inbound = socket.recv() => {
                if !handle_inbound(&server, &mut socket, id, inbound).await {
                    break;
                }
            }
        }
    }

    let state = server.finish(id).await;
    info!(connection_id = id, ?state, "WebSocket connection ended");
}

/// Returns `false` once the connection should stop.
async fn handle_inbound(
    server: &BroadcastServer,
    socket: &mut WebSocket,
    id: ConnectionId,
    inbound: Option<Result<Message, axum::Error>>,
) -> bool {
    let registry = server.registry();
    match inbound {
        Some(Ok(Message::Text(text))) => {
            registry.relay(id, &Frame::Text(text.as_str().to_owned())).await;
            true
        }
        Some(Ok(Message::Binary(data))) => {
            registry.relay(id, &Frame::Binary(data)).await;
            true
        }
        Some(Ok(Message::Pong(_))) => {
            registry.mark_alive(id).await;
            true
        }
        // Pings are answered by the protocol layer.
        Some(Ok(Message::Ping(_))) => true,
        Some(Ok(Message::Close(frame))) => {
            registry.begin_close(id).await;
            // Flushes the protocol's queued close reply.
            if let Err(e) = socket.send(Message::Close(frame)).await {
                debug!(connection_id = id, error = %e, "Close reply failed");
            }
            false
        }
        Some(Err(e)) => {
            warn!(connection_id = id, error = %e, "WebSocket error");
            false
        }
        None => false,
    }
}
