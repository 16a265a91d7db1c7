//! Cluster node identity

use serde::{Deserialize, Serialize};

/// A single member of the fixed peer set.
///
/// `id` is the cluster-unique handle used everywhere else in this crate
/// (the ring, the health tracker, the registry); `addr` is the transport
/// endpoint peers dial to reach it. The two are typically identical
/// (`host:port`), but are kept distinct since nothing here requires it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub addr: String,
}

impl Node {
    pub fn new(id: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
        }
    }

    /// A node whose id and addr are the same string.
    pub fn same(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            addr: id.clone(),
            id,
        }
    }
}
