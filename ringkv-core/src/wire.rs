//! JSON shapes shared by the external client API and peer-to-peer calls.
//!
//! Peer-to-peer calls reuse `/set`, `/get`, and `/delete` verbatim, so the
//! wire types live here rather than in the server crate, letting
//! [`crate::peer::HttpPeerClient`] speak the exact shape the HTTP layer
//! parses and produces.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRequestWire {
    pub key: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub ttl: i64,
    /// Set by a forwarding coordinator; absent on a request from a client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponseWire {
    pub key: String,
    pub value: serde_json::Value,
    pub last_updated: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesResponseWire {
    pub nodes: Vec<String>,
    #[serde(rename = "self")]
    pub self_id: String,
}
