mod config;
mod http;
mod state;

use clap::Parser;
use config::Args;
use ringkv_core::{ClusterRegistry, EntryStore, HealthTracker, HttpPeerClient, Node, RequestCoordinator, SystemClock};
use state::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Virtual points per node on the hash ring. A build-time constant, not
/// an environment input.
const VPOINTS_PER_NODE: usize = 100;

/// Interval between health-probe rounds.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

/// Timeout applied to outbound peer requests (replication, reads, probes).
const PEER_TIMEOUT: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().resolve();
    tracing::info!(
        node_id = %config.node_id,
        port = config.port,
        replica_count = config.replica_count,
        "starting ringkv-server"
    );

    let self_node = Node::same(&config.node_id);
    let peer_nodes: Vec<Node> = config
        .peer_ids
        .iter()
        .filter(|id| **id != config.node_id)
        .map(|id| Node::same(id))
        .collect();

    let addrs: HashMap<String, String> = peer_nodes
        .iter()
        .map(|n| (n.id.clone(), format!("http://{}", n.addr)))
        .collect();
    let peer_client = Arc::new(HttpPeerClient::new(addrs, PEER_TIMEOUT));

    let health = Arc::new(HealthTracker::new(
        HEARTBEAT_INTERVAL,
        Arc::clone(&peer_client) as Arc<dyn ringkv_core::PeerClient>,
    ));

    let registry = Arc::new(
        ClusterRegistry::new(self_node, peer_nodes, VPOINTS_PER_NODE)
            .with_health_tracker(Arc::clone(&health)),
    );
    Arc::clone(&health).start();

    let clock = Arc::new(SystemClock);
    let store = Arc::new(EntryStore::new(clock.clone()));
    let coordinator = Arc::new(RequestCoordinator::new(
        Arc::clone(&registry),
        store,
        peer_client as Arc<dyn ringkv_core::PeerClient>,
        clock,
        config.replica_count,
    ));

    let app_state = AppState {
        coordinator,
        registry,
    };
    let app = http::router(app_state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind_addr = %bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
