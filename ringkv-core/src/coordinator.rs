//! The request coordinator: turns a transport-neutral write/read/remove
//! request into store operations and peer fan-out.
//!
//! Deliberately has no axum/HTTP types in it. The server crate maps wire
//! requests onto `WriteRequest`/`RemoveRequest` and maps the
//! `Result<_, CacheError>` back onto status codes; this module only knows
//! about the registry, the store, and peer clients, which keeps its logic
//! testable with an in-memory `PeerClient` double instead of real sockets.

use crate::clock::SharedClock;
use crate::error::{CacheError, Result};
use crate::node::Node;
use crate::peer::PeerClient;
use crate::registry::ClusterRegistry;
use crate::store::{EntryStore, PutOutcome, ReadEntry};
use std::sync::Arc;

/// A write fanned out to a replica, over the wire or in-process. Carrying
/// `last_updated_ms` is what lets a receiving replica tell a forwarded
/// write apart from one arriving straight from a client: forwards always
/// set it, so the receiver only ever stores locally and never re-forwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReplicatedPut {
    pub key: String,
    pub value: Vec<u8>,
    pub ttl_seconds: i64,
    pub last_updated_ms: i64,
}

#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub key: String,
    pub value: Vec<u8>,
    pub ttl_seconds: i64,
    /// Present only on a forwarded write; absent on one a client sent
    /// directly, in which case this coordinator assigns it from its clock.
    pub last_updated_ms: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Stored,
    Conflict,
}

impl From<PutOutcome> for WriteOutcome {
    fn from(outcome: PutOutcome) -> Self {
        match outcome {
            PutOutcome::Stored => WriteOutcome::Stored,
            PutOutcome::RejectedStale => WriteOutcome::Conflict,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub key: String,
    pub value: Vec<u8>,
    pub last_updated_ms: i64,
}

pub struct RequestCoordinator {
    registry: Arc<ClusterRegistry>,
    store: Arc<EntryStore>,
    peers: Arc<dyn PeerClient>,
    clock: SharedClock,
    replica_count: usize,
}

impl RequestCoordinator {
    pub fn new(
        registry: Arc<ClusterRegistry>,
        store: Arc<EntryStore>,
        peers: Arc<dyn PeerClient>,
        clock: SharedClock,
        replica_count: usize,
    ) -> Self {
        Self {
            registry,
            store,
            peers,
            clock,
            replica_count: replica_count.max(1),
        }
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("key must not be empty".into()));
        }
        Ok(())
    }

    fn is_self(&self, node: &Node) -> bool {
        node.id == self.registry.self_node().id
    }

    /// This node's own entry store, used by the HTTP layer's internal
    /// replication path to apply a peer-forwarded write directly.
    pub fn local_store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ClusterRegistry> {
        &self.registry
    }

    fn healthy_replicas(&self, key: &str) -> Result<Vec<Node>> {
        let replicas = self.registry.responsible(key, self.replica_count);
        let healthy: Vec<Node> = replicas
            .into_iter()
            .filter(|n| self.registry.is_healthy(&n.id))
            .collect();
        if healthy.is_empty() {
            Err(CacheError::NoHealthyReplicas)
        } else {
            Ok(healthy)
        }
    }

    /// A write either arrives from a client (`last_updated_ms: None`,
    /// this coordinator assigns the timestamp and fans out to the rest
    /// of the replica set) or from another coordinator's fan-out
    /// (`Some(ts)`, applied locally with no further forwarding — the
    /// single place this distinction is checked, which is what keeps the
    /// fan-out from bouncing between replicas forever).
    pub async fn write(&self, req: WriteRequest) -> Result<WriteOutcome> {
        Self::validate_key(&req.key)?;
        if req.ttl_seconds < 0 {
            return Err(CacheError::InvalidRequest("ttl_seconds must not be negative".into()));
        }

        let healthy = self.healthy_replicas(&req.key)?;

        if let Some(last_updated_ms) = req.last_updated_ms {
            let outcome = self.store.put(&req.key, req.value, req.ttl_seconds, last_updated_ms);
            return Ok(outcome.into());
        }

        let last_updated_ms = self.clock.now_ms();
        let self_is_healthy_replica = healthy.iter().any(|n| self.is_self(n));

        let outcome = if self_is_healthy_replica {
            self.store.put(&req.key, req.value.clone(), req.ttl_seconds, last_updated_ms)
        } else {
            // A pure coordinator has nothing local to compare against, so
            // it has no basis for a conflict verdict; it reports success
            // optimistically, matching the fire-and-forget, unacknowledged
            // fan-out the write path is built around.
            PutOutcome::Stored
        };

        // A rejected-stale local write means this node's resident value is
        // authoritative-newer than the sender's: report the conflict and
        // leave the rest of the replica set untouched rather than fanning
        // out a write the rest of the cluster should also reject.
        if outcome == PutOutcome::RejectedStale {
            return Ok(outcome.into());
        }

        let replicated = ReplicatedPut {
            key: req.key,
            value: req.value,
            ttl_seconds: req.ttl_seconds,
            last_updated_ms,
        };
        self.fan_out_put(&healthy, &replicated);

        Ok(outcome.into())
    }

    /// Replicate to every healthy replica except `self`, without waiting
    /// for any of them: failures are logged, not surfaced, since the
    /// client has already been told the write is stored.
    fn fan_out_put(&self, healthy: &[Node], req: &ReplicatedPut) {
        for node in healthy {
            if self.is_self(node) {
                continue;
            }
            let peers = Arc::clone(&self.peers);
            let node_id = node.id.clone();
            let req = req.clone();
            tokio::spawn(async move {
                if let Err(err) = peers.forward_put(&node_id, req).await {
                    tracing::warn!(node_id, error = %err, "replication to peer failed");
                }
            });
        }
    }

    /// First-success-wins: tries replicas in ring order (self first, if it
    /// is one) and returns the first value found. No attempt is made to
    /// reconcile disagreeing replicas.
    pub async fn read(&self, key: &str) -> Result<ReadOutcome> {
        Self::validate_key(key)?;

        let mut ordered = self.healthy_replicas(key)?;
        if let Some(pos) = ordered.iter().position(|n| self.is_self(n)) {
            ordered.swap(0, pos);
        }

        for node in &ordered {
            let found: Option<ReadEntry> = if self.is_self(node) {
                self.store.get(key)
            } else {
                self.peers.forward_get(&node.id, key).await.unwrap_or(None)
            };
            if let Some(entry) = found {
                return Ok(ReadOutcome {
                    key: key.to_string(),
                    value: entry.value,
                    last_updated_ms: entry.last_updated_ms,
                });
            }
        }

        Err(CacheError::NotFound)
    }

    /// Preserves the documented delete asymmetry: when this node is
    /// itself one of `key`'s replicas, a delete only removes its own
    /// local copy and does not fan out — unlike `write`, where the
    /// replica path fans out same as the pure-coordinator path. A pure
    /// coordinator (not itself a replica) fans the delete out to every
    /// *healthy* replica, same as a write fan-out, and does not wait on
    /// any of them.
    pub async fn remove(&self, key: &str) -> Result<()> {
        Self::validate_key(key)?;

        let healthy = self.healthy_replicas(key)?;
        if healthy.iter().any(|n| self.is_self(n)) {
            self.store.delete(key);
            return Ok(());
        }

        for node in &healthy {
            let peers = Arc::clone(&self.peers);
            let node_id = node.id.clone();
            let key = key.to_string();
            tokio::spawn(async move {
                if let Err(err) = peers.forward_delete(&node_id, &key).await {
                    tracing::warn!(node_id, error = %err, "replicated delete failed");
                }
            });
        }
        Ok(())
    }
}
