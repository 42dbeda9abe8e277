//! In-memory registry of WebSocket connections and their liveness.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

pub type ConnectionId = u64;

/// Application payload relayed between peers, passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

/// Instruction for a connection's socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(Frame),
    /// Liveness probe.
    Ping,
    /// Drop the socket without a close handshake.
    Terminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
    Terminated,
}

struct ConnectionEntry {
    tx: mpsc::UnboundedSender<Outbound>,
    state: ConnectionState,
    is_alive: bool,
}

/// Outcome of one heartbeat sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub probed: usize,
    pub terminated: Vec<ConnectionId>,
}

/// Thread-safe registry of tracked connections.
///
/// Every read-modify-write (liveness check and eviction, relay fan-out)
/// runs under the registry lock.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection in the `Connecting` state.
    pub async fn register(&self, tx: mpsc::UnboundedSender<Outbound>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.write().await.insert(
            id,
            ConnectionEntry {
                tx,
                state: ConnectionState::Connecting,
                is_alive: false,
            },
        );
        debug!(connection_id = id, "Connection registered");
        id
    }

    /// Handshake finished: the connection is `Open` and alive.
    pub async fn mark_open(&self, id: ConnectionId) -> bool {
        self.update(id, |entry| {
            entry.state = ConnectionState::Open;
            entry.is_alive = true;
        })
        .await
    }

    /// Probe acknowledged.
    pub async fn mark_alive(&self, id: ConnectionId) -> bool {
        self.update(id, |entry| entry.is_alive = true).await
    }

    /// Peer started a close; no more frames are relayed to it.
    pub async fn begin_close(&self, id: ConnectionId) -> bool {
        self.update(id, |entry| entry.state = ConnectionState::Closing)
            .await
    }

    /// Stop tracking a connection. Returns `Closed`, or `None` if it was
    /// already gone (e.g. terminated by the heartbeat).
    pub async fn unregister(&self, id: ConnectionId) -> Option<ConnectionState> {
        let removed = self.connections.write().await.remove(&id);
        removed.map(|entry| {
            info!(connection_id = id, from = ?entry.state, "Connection closed");
            ConnectionState::Closed
        })
    }

    /// Send `frame` to every `Open` connection except `from`.
    ///
    /// Returns the number of peers it was queued for.
    pub async fn relay(&self, from: ConnectionId, frame: &Frame) -> usize {
        let connections = self.connections.read().await;
        let mut delivered = 0;
        for (&id, entry) in connections.iter() {
            if id == from || entry.state != ConnectionState::Open {
                continue;
            }
            if entry.tx.send(Outbound::Frame(frame.clone())).is_ok() {
                delivered += 1;
            } else {
                debug!(connection_id = id, "Relay target already gone");
            }
        }
        delivered
    }

    /// One heartbeat cycle.
    ///
    /// A connection that has not acknowledged the previous probe is
    /// terminated and removed; every other connection is marked not-alive
    /// and probed again.
    pub async fn sweep(&self) -> SweepReport {
        let mut connections = self.connections.write().await;
        let mut report = SweepReport::default();

        connections.retain(|&id, entry| {
            if !entry.is_alive {
                let _ = entry.tx.send(Outbound::Terminate);
                warn!(connection_id = id, "Terminating unresponsive connection");
                report.terminated.push(id);
                return false;
            }
            entry.is_alive = false;
            if entry.tx.send(Outbound::Ping).is_err() {
                debug!(connection_id = id, "Dropping connection with closed queue");
                report.terminated.push(id);
                return false;
            }
            report.probed += 1;
            true
        });

        report
    }

    /// Terminate and forget every connection.
    pub async fn terminate_all(&self) -> usize {
        let mut connections = self.connections.write().await;
        let count = connections.len();
        for entry in connections.values() {
            let _ = entry.tx.send(Outbound::Terminate);
        }
        connections.clear();
        count
    }

    pub async fn state(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.connections.read().await.get(&id).map(|entry| entry.state)
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Connections currently eligible to receive relayed frames.
    pub async fn open_count(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|entry| entry.state == ConnectionState::Open)
            .count()
    }

    async fn update(&self, id: ConnectionId, f: impl FnOnce(&mut ConnectionEntry)) -> bool {
        match self.connections.write().await.get_mut(&id) {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        }
    }
}
