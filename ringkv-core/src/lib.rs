//! Partitioning, replication coordination, and health monitoring for a
//! cluster of in-memory key-value cache nodes.
//!
//! This crate is transport-agnostic: it has no axum or HTTP types. The
//! binary crate wires [`coordinator::RequestCoordinator`] to a concrete
//! transport and exposes it over HTTP.

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod health;
pub mod node;
pub mod peer;
pub mod registry;
pub mod ring;
pub mod store;
pub mod wire;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use coordinator::{ReadOutcome, RequestCoordinator, WriteOutcome, WriteRequest};
pub use error::{CacheError, Result};
pub use health::HealthTracker;
pub use node::Node;
pub use peer::{HttpPeerClient, PeerClient};
pub use registry::ClusterRegistry;
pub use ring::HashRing;
pub use store::EntryStore;
pub use wire::{GetResponseWire, NodesResponseWire, SetRequestWire};
