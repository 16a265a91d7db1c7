//! Peer health tracking via periodic heartbeat probes.
//!
//! Grounded on the teacher's `HealthChecker`: a background task owns a
//! `start`/`stop` lifecycle and mutates a shared table that the request
//! path only ever reads. Unlike the teacher's three-state (alive/suspect/
//! dead) machine with failure-count hysteresis, this tracker keeps a flat
//! boolean per peer — the source design calls for "healthy" vs
//! "unhealthy" with no intermediate state.

use crate::peer::PeerClient;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Shared table of peer health, updated by the probe loop and read by the
/// coordinator when selecting which replicas to contact.
pub struct HealthTracker {
    interval: Duration,
    probe_timeout: Duration,
    peers: Arc<dyn PeerClient>,
    healthy: Arc<RwLock<HashMap<String, bool>>>,
    shutdown: Arc<Notify>,
    handle: RwLock<Option<JoinHandle<()>>>,
}

impl HealthTracker {
    /// `probe_timeout` is clamped to at most half of `interval`, so a
    /// stalled probe can never make the tracker miss its next scheduled
    /// round.
    pub fn new(interval: Duration, peers: Arc<dyn PeerClient>) -> Self {
        let probe_timeout = interval / 2;
        Self {
            interval,
            probe_timeout,
            peers,
            healthy: Arc::new(RwLock::new(HashMap::new())),
            shutdown: Arc::new(Notify::new()),
            handle: RwLock::new(None),
        }
    }

    /// Register a peer to be probed. Peers start out absent from the
    /// table, which `is_healthy` treats as unhealthy until the first
    /// probe round completes.
    pub fn register(&self, node_id: &str) {
        self.healthy.write().entry(node_id.to_string()).or_insert(false);
    }

    /// A node with no entry in the table is considered unhealthy: it has
    /// either never been probed or was removed from membership.
    pub fn is_healthy(&self, node_id: &str) -> bool {
        self.healthy.read().get(node_id).copied().unwrap_or(false)
    }

    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.healthy.read().clone()
    }

    /// Spawn the background probe loop. A second call while already
    /// running is a no-op. Takes `Arc<Self>` by value; callers that keep
    /// using the tracker afterwards should pass a clone.
    pub fn start(self: Arc<Self>) {
        if self.handle.read().is_some() {
            return;
        }
        let this = Arc::clone(&self);
        let task = tokio::spawn(async move { this.run_loop().await });
        *self.handle.write() = Some(task);
    }

    pub fn stop(&self) {
        self.shutdown.notify_waiters();
        if let Some(handle) = self.handle.write().take() {
            handle.abort();
        }
    }

    async fn run_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.probe_all().await,
                _ = self.shutdown.notified() => {
                    tracing::info!("health tracker stopping");
                    return;
                }
            }
        }
    }

    /// Run one probe round synchronously. `pub` (rather than private to
    /// the run loop) so tests can force a deterministic round instead of
    /// waiting on the interval ticker.
    pub async fn probe_all(&self) {
        let node_ids: Vec<String> = self.healthy.read().keys().cloned().collect();
        for node_id in node_ids {
            let outcome = tokio::time::timeout(self.probe_timeout, self.peers.ping(&node_id)).await;
            let reachable = matches!(outcome, Ok(Ok(())));
            if !reachable {
                if let Ok(Err(err)) = outcome {
                    tracing::warn!(node_id, error = %err, "heartbeat probe failed");
                } else {
                    tracing::warn!(node_id, "heartbeat probe timed out");
                }
            }
            self.healthy.write().insert(node_id, reachable);
        }
    }
}

impl Drop for HealthTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
