//! Shared application state handed to every axum handler.

use ringkv_core::{ClusterRegistry, RequestCoordinator};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RequestCoordinator>,
    pub registry: Arc<ClusterRegistry>,
}
