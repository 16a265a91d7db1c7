//! Abstraction over calls made to other cluster members.
//!
//! Grounded on the teacher's `discovery::static::StaticDiscovery`: an
//! `async_trait` seam between the coordinator/health tracker and the
//! concrete transport, so tests can substitute an in-memory double for
//! real network calls. The production implementation speaks JSON over
//! HTTP with `reqwest`, since the wire contract here is a JSON request/
//! response pair rather than the teacher's QUIC/tarpc RPC channel. Peer
//! calls reuse the same `/set`, `/get`, `/delete` routes a client would
//! hit — there is no separate internal protocol.

use crate::coordinator::ReplicatedPut;
use crate::error::{CacheError, Result};
use crate::store::ReadEntry;
use crate::wire::{GetResponseWire, SetRequestWire};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Calls this node can make against other members of the cluster.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Liveness probe used by the health tracker.
    async fn ping(&self, node_id: &str) -> Result<()>;

    /// Replicate a write to `node_id`. Fire-and-forget at the call site:
    /// the coordinator does not block a client response on this.
    async fn forward_put(&self, node_id: &str, req: ReplicatedPut) -> Result<()>;

    /// Read the value for `key` from `node_id`, if it has one.
    async fn forward_get(&self, node_id: &str, key: &str) -> Result<Option<ReadEntry>>;

    /// Replicate a delete to `node_id`.
    async fn forward_delete(&self, node_id: &str, key: &str) -> Result<()>;
}

/// `reqwest`-backed `PeerClient` that resolves node ids to addresses
/// through a fixed table handed in at construction.
pub struct HttpPeerClient {
    client: reqwest::Client,
    addrs: HashMap<String, String>,
}

impl HttpPeerClient {
    pub fn new(addrs: HashMap<String, String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with a fixed timeout always builds");
        Self { client, addrs }
    }

    fn base_url(&self, node_id: &str) -> Result<&str> {
        self.addrs
            .get(node_id)
            .map(String::as_str)
            .ok_or_else(|| CacheError::Transport(format!("unknown peer: {node_id}")))
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn ping(&self, node_id: &str) -> Result<()> {
        let url = format!("{}/heartbeat", self.base_url(node_id)?);
        let resp = self.client.get(url).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(CacheError::Transport(format!(
                "heartbeat to {node_id} returned {}",
                resp.status()
            )))
        }
    }

    async fn forward_put(&self, node_id: &str, req: ReplicatedPut) -> Result<()> {
        let url = format!("{}/set", self.base_url(node_id)?);
        let value: serde_json::Value =
            serde_json::from_slice(&req.value).unwrap_or(serde_json::Value::Null);
        let body = SetRequestWire {
            key: req.key,
            value,
            ttl: req.ttl_seconds,
            last_updated: Some(req.last_updated_ms),
        };
        let resp = self.client.post(url).json(&body).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(CacheError::Transport(format!(
                "set to {node_id} returned {}",
                resp.status()
            )))
        }
    }

    async fn forward_get(&self, node_id: &str, key: &str) -> Result<Option<ReadEntry>> {
        let url = format!("{}/get", self.base_url(node_id)?);
        let resp = self.client.get(url).query(&[("key", key)]).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(CacheError::Transport(format!(
                "get from {node_id} returned {}",
                resp.status()
            )));
        }
        let wire: GetResponseWire = resp.json().await?;
        let value = serde_json::to_vec(&wire.value).unwrap_or_default();
        Ok(Some(ReadEntry {
            value,
            last_updated_ms: wire.last_updated,
        }))
    }

    async fn forward_delete(&self, node_id: &str, key: &str) -> Result<()> {
        let url = format!("{}/delete", self.base_url(node_id)?);
        let resp = self.client.delete(url).query(&[("key", key)]).send().await?;
        if resp.status().is_success() || resp.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(CacheError::Transport(format!(
                "delete on {node_id} returned {}",
                resp.status()
            )))
        }
    }
}
