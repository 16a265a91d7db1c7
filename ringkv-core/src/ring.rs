//! Consistent hash ring used to pick the replica set responsible for a key.
//!
//! The ring is a sorted array of virtual points rather than a `BTreeMap`:
//! with a fixed, rarely-changing peer set there is no benefit to a tree's
//! incremental insert cost over a `Vec` we resort on membership change, and
//! a sorted `Vec` lets the hot path (`responsible`) binary search instead
//! of walking a tree.

use sha1::{Digest, Sha1};
use std::cmp::Ordering;

const DEFAULT_VPOINTS_PER_NODE: usize = 100;

/// One virtual point on the ring: a hash position owned by `node_id`.
#[derive(Debug, Clone)]
struct VPoint {
    hash: u32,
    node_id: String,
}

/// Consistent hash ring over a set of node ids.
///
/// Each node is assigned `vpoints_per_node` positions, derived by hashing
/// `"{node_id}#{i}"` for `i` in `0..vpoints_per_node`. Lookups walk the
/// ring clockwise from a key's hash and collect distinct node ids until
/// `count` are found or the ring is exhausted.
#[derive(Debug, Clone)]
pub struct HashRing {
    vpoints_per_node: usize,
    points: Vec<VPoint>,
}

impl HashRing {
    pub fn new(vpoints_per_node: usize) -> Self {
        Self {
            vpoints_per_node: vpoints_per_node.max(1),
            points: Vec::new(),
        }
    }

    pub fn with_nodes<I, S>(vpoints_per_node: usize, node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ring = Self::new(vpoints_per_node);
        for id in node_ids {
            ring.add_node(id.as_ref());
        }
        ring
    }

    /// Hash of a ring key: the last four bytes of its SHA-1 digest
    /// (bytes 16..20), read big-endian. Pinning this exact derivation
    /// keeps ring placement reproducible against any other component
    /// that routes with the same formula.
    pub fn hash_key(key: &str) -> u32 {
        let digest = Sha1::digest(key.as_bytes());
        u32::from_be_bytes([digest[16], digest[17], digest[18], digest[19]])
    }

    pub fn add_node(&mut self, node_id: &str) {
        self.remove_node(node_id);
        for i in 0..self.vpoints_per_node {
            let label = format!("{node_id}#{i}");
            self.points.push(VPoint {
                hash: Self::hash_key(&label),
                node_id: node_id.to_string(),
            });
        }
        self.points.sort_by(Self::point_order);
    }

    pub fn remove_node(&mut self, node_id: &str) {
        self.points.retain(|p| p.node_id != node_id);
    }

    /// Total distinct nodes currently placed on the ring.
    pub fn node_count(&self) -> usize {
        let mut ids: Vec<&str> = self.points.iter().map(|p| p.node_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The single node clockwise-nearest to `key`'s hash.
    pub fn primary(&self, key: &str) -> Option<String> {
        self.top_k(key, 1).into_iter().next()
    }

    /// Up to `count` distinct nodes walking clockwise from `key`'s hash,
    /// in ring order. Returns fewer than `count` if the ring holds fewer
    /// distinct nodes than requested.
    pub fn top_k(&self, key: &str, count: usize) -> Vec<String> {
        if self.points.is_empty() || count == 0 {
            return Vec::new();
        }

        let hash = Self::hash_key(key);
        let start = self.points.partition_point(|p| p.hash < hash);

        let mut result: Vec<String> = Vec::with_capacity(count);
        for offset in 0..self.points.len() {
            let point = &self.points[(start + offset) % self.points.len()];
            if !result.iter().any(|id| id == &point.node_id) {
                result.push(point.node_id.clone());
                if result.len() == count {
                    break;
                }
            }
        }
        result
    }

    /// Stable order for points with equal hashes: tie-break on node id so
    /// ring construction is deterministic regardless of insertion order.
    fn point_order(a: &VPoint, b: &VPoint) -> Ordering {
        a.hash.cmp(&b.hash).then_with(|| a.node_id.cmp(&b.node_id))
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_VPOINTS_PER_NODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_ring_returns_nothing() {
        let ring = HashRing::new(8);
        assert_eq!(ring.primary("a"), None);
        assert!(ring.top_k("a", 3).is_empty());
    }

    #[test]
    fn top_k_returns_distinct_nodes_in_ring_order() {
        let ring = HashRing::with_nodes(8, ["n1", "n2", "n3"]);
        let top = ring.top_k("some-key", 2);
        assert_eq!(top.len(), 2);
        assert_ne!(top[0], top[1]);
    }

    #[test]
    fn requesting_more_than_available_nodes_returns_all_of_them() {
        let ring = HashRing::with_nodes(8, ["n1", "n2"]);
        let top = ring.top_k("some-key", 5);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn lookup_is_deterministic_for_a_fixed_membership() {
        // P3: same ring, same key, same answer across repeated calls.
        let ring = HashRing::with_nodes(16, ["n1", "n2", "n3", "n4"]);
        let first = ring.top_k("repeatable-key", 3);
        let second = ring.top_k("repeatable-key", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn removing_a_node_drops_it_from_results() {
        let mut ring = HashRing::with_nodes(16, ["n1", "n2", "n3"]);
        ring.remove_node("n2");
        assert_eq!(ring.node_count(), 2);
        for _ in 0..20 {
            assert!(!ring.top_k("k", 2).contains(&"n2".to_string()));
        }
    }

    #[test]
    fn adding_a_node_twice_does_not_duplicate_its_vpoints() {
        let mut ring = HashRing::new(8);
        ring.add_node("n1");
        ring.add_node("n1");
        assert_eq!(ring.points.len(), 8);
    }

    #[test]
    fn distribution_is_reasonably_balanced_across_nodes() {
        // P4 soft guard: with enough vpoints, no node should own a wildly
        // disproportionate share of sampled keys.
        let ring = HashRing::with_nodes(128, ["n1", "n2", "n3", "n4"]);
        let mut counts: HashMap<String, u32> = HashMap::new();
        let samples = 4000;
        for i in 0..samples {
            let key = format!("key-{i}");
            if let Some(owner) = ring.primary(&key) {
                *counts.entry(owner).or_insert(0) += 1;
            }
        }
        let mean = samples as f64 / counts.len() as f64;
        for count in counts.values() {
            let ratio = *count as f64 / mean;
            assert!(ratio > 0.5 && ratio < 1.5, "ratio {ratio} out of range");
        }
    }

    #[test]
    fn hash_key_matches_sha1_bytes_16_to_19_big_endian() {
        let digest = Sha1::digest(b"hello");
        let expected = u32::from_be_bytes([digest[16], digest[17], digest[18], digest[19]]);
        assert_eq!(HashRing::hash_key("hello"), expected);
    }
}
