//! HTTP transport: wire types, the axum router, and handlers.
//!
//! Grounded on the teacher's `api::routes`/`api::server`: handlers return
//! `Result<_, StatusCode>` and match each `CacheError` variant to a
//! status code by hand rather than through a blanket `IntoResponse` impl,
//! the same manual-match house style the teacher uses throughout its own
//! `api` module. Peer-to-peer calls reuse these same routes (see
//! `ringkv_core::peer::HttpPeerClient`), distinguished only by whether the
//! request body carries `last_updated`.

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use ringkv_core::coordinator::{WriteOutcome, WriteRequest};
use ringkv_core::wire::{GetResponseWire, NodesResponseWire, SetRequestWire};
use ringkv_core::CacheError;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/set", post(set_key))
        .route("/get", get(get_key))
        .route("/delete", delete(delete_key))
        .route("/heartbeat", get(heartbeat))
        .route("/health", get(health))
        .route("/nodes", get(nodes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(err: &CacheError) -> StatusCode {
    match err {
        CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        CacheError::Conflict => StatusCode::CONFLICT,
        CacheError::NotFound => StatusCode::NOT_FOUND,
        CacheError::NoHealthyReplicas => StatusCode::SERVICE_UNAVAILABLE,
        CacheError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    key: String,
}

#[tracing::instrument(skip(state, body))]
async fn set_key(
    State(state): State<AppState>,
    Json(body): Json<SetRequestWire>,
) -> Result<(StatusCode, String), StatusCode> {
    if body.key.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let value = serde_json::to_vec(&body.value).map_err(|_| StatusCode::BAD_REQUEST)?;
    let outcome = state
        .coordinator
        .write(WriteRequest {
            key: body.key,
            value,
            ttl_seconds: body.ttl,
            last_updated_ms: body.last_updated,
        })
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, kind = err.kind(), "set failed");
            status_for(&err)
        })?;

    Ok(match outcome {
        WriteOutcome::Stored => (StatusCode::NO_CONTENT, String::new()),
        WriteOutcome::Conflict => (StatusCode::CONFLICT, CacheError::Conflict.to_string()),
    })
}

#[tracing::instrument(skip(state))]
async fn get_key(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponseWire>, StatusCode> {
    if query.key.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let outcome = state.coordinator.read(&query.key).await.map_err(|err| {
        if !matches!(err, CacheError::NotFound) {
            tracing::warn!(error = %err, kind = err.kind(), "get failed");
        }
        status_for(&err)
    })?;
    let value: serde_json::Value =
        serde_json::from_slice(&outcome.value).unwrap_or(serde_json::Value::Null);
    Ok(Json(GetResponseWire {
        key: outcome.key,
        value,
        last_updated: outcome.last_updated_ms,
    }))
}

#[tracing::instrument(skip(state))]
async fn delete_key(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<StatusCode, StatusCode> {
    if query.key.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    state
        .coordinator
        .remove(&query.key)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|err| status_for(&err))
}

async fn heartbeat() -> &'static str {
    "ALIVE"
}

async fn health() -> &'static str {
    "OK"
}

async fn nodes(State(state): State<AppState>) -> Json<NodesResponseWire> {
    Json(NodesResponseWire {
        nodes: state.registry.nodes().into_iter().map(|n| n.id).collect(),
        self_id: state.registry.self_node().id.clone(),
    })
}
