//! Static view of cluster membership: the fixed node table, the hash ring
//! built over it, and the health tracker watching it.
//!
//! Grounded on the teacher's `ClusterConfig`/`ClusterState` pairing in
//! `prism-server`: a read-mostly struct assembled once at startup and
//! shared behind an `Arc` by the HTTP layer and the coordinator.

use crate::health::HealthTracker;
use crate::node::Node;
use crate::ring::HashRing;
use std::collections::HashMap;
use std::sync::Arc;

/// The fixed set of nodes in the cluster, the ring computed over them,
/// and (optionally) the health tracker watching them.
pub struct ClusterRegistry {
    self_node: Node,
    nodes: HashMap<String, Node>,
    ring: HashRing,
    health: Option<Arc<HealthTracker>>,
}

impl ClusterRegistry {
    pub fn new(self_node: Node, peers: Vec<Node>, vpoints_per_node: usize) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(self_node.id.clone(), self_node.clone());
        for peer in peers {
            nodes.insert(peer.id.clone(), peer);
        }

        let ring = HashRing::with_nodes(vpoints_per_node, nodes.keys());

        Self {
            self_node,
            nodes,
            ring,
            health: None,
        }
    }

    pub fn with_health_tracker(mut self, health: Arc<HealthTracker>) -> Self {
        for node_id in self.nodes.keys() {
            health.register(node_id);
        }
        self.health = Some(health);
        self
    }

    pub fn self_node(&self) -> &Node {
        &self.self_node
    }

    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// The (unfiltered) replica set for `key`: the `count` nodes the ring
    /// assigns it, regardless of current health. Callers that need only
    /// healthy replicas filter this list themselves, since the
    /// pre-flight step of a request needs the full set to decide whether
    /// this node is a replica at all.
    pub fn responsible(&self, key: &str, count: usize) -> Vec<Node> {
        self.ring
            .top_k(key, count)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id).cloned())
            .collect()
    }

    /// A node absent from the health table is treated as healthy when no
    /// tracker has been started: without monitoring running, membership
    /// alone is the only signal available.
    pub fn is_healthy(&self, node_id: &str) -> bool {
        match &self.health {
            Some(tracker) => node_id == self.self_node.id || tracker.is_healthy(node_id),
            None => true,
        }
    }

    pub fn health_tracker(&self) -> Option<&Arc<HealthTracker>> {
        self.health.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(self_id: &str, peer_ids: &[&str]) -> ClusterRegistry {
        let self_node = Node::same(self_id);
        let peers = peer_ids.iter().map(|id| Node::same(*id)).collect();
        ClusterRegistry::new(self_node, peers, 16)
    }

    #[test]
    fn responsible_returns_requested_replica_count() {
        let registry = registry("n1", &["n2", "n3", "n4"]);
        let replicas = registry.responsible("some-key", 3);
        assert_eq!(replicas.len(), 3);
    }

    #[test]
    fn without_a_health_tracker_every_node_is_considered_healthy() {
        let registry = registry("n1", &["n2"]);
        assert!(registry.is_healthy("n2"));
        assert!(registry.is_healthy("n1"));
    }

    #[test]
    fn nodes_lists_every_member_including_self() {
        let registry = registry("n1", &["n2", "n3"]);
        let ids: Vec<String> = registry.nodes().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["n1", "n2", "n3"]);
    }
}
