//! Broadcast server: owns the registry and the heartbeat task.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::registry::{ConnectionId, ConnectionRegistry, ConnectionState};

/// Relays every inbound frame to all other open connections and evicts
/// peers that stop answering probes.
#[derive(Clone)]
pub struct BroadcastServer {
    registry: ConnectionRegistry,
    heartbeat_period: Duration,
    shutdown: CancellationToken,
}

impl BroadcastServer {
    pub fn new(heartbeat_period: Duration) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            heartbeat_period,
            shutdown: CancellationToken::new(),
        }
    }

    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub const fn heartbeat_period(&self) -> Duration {
        self.heartbeat_period
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawn the periodic liveness sweep. It stops once [`close`](Self::close) runs.
    pub fn spawn_heartbeat(&self) -> JoinHandle<()> {
        tokio::spawn(run_heartbeat(
            self.registry.clone(),
            self.heartbeat_period,
            self.shutdown.clone(),
        ))
    }

    /// Stop the heartbeat and terminate all connections.
    pub async fn close(&self) {
        self.shutdown.cancel();
        let terminated = self.registry.terminate_all().await;
        info!(terminated, "Broadcast server closed");
    }

    /// Final state for a connection whose socket task is ending.
    ///
    /// `Terminated` if the heartbeat or shutdown already evicted it.
    pub async fn finish(&self, id: ConnectionId) -> ConnectionState {
        self.registry
            .unregister(id)
            .await
            .unwrap_or(ConnectionState::Terminated)
    }
}

/// Heartbeat loop over `registry`.
///
/// The first sweep happens one full period after start, so a fresh
/// connection always gets one probe before it can be evicted.
pub async fn run_heartbeat(
    registry: ConnectionRegistry,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                debug!("Heartbeat stopped");
                return;
            }
            _ = ticker.tick() => {
                let report = registry.sweep().await;
                if !report.terminated.is_empty() {
                    info!(
                        probed = report.probed,
                        terminated = report.terminated.len(),
                        "Heartbeat evicted connections"
                    );
                }
            }
        }
    }
}
