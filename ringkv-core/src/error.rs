//! Cache-wide error types

use thiserror::Error;

/// Errors surfaced by the entry store, the coordinator, and peer transport.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("conflict: incoming update is older than current value")]
    Conflict,

    #[error("not found")]
    NotFound,

    #[error("no healthy replicas available for this key")]
    NoHealthyReplicas,

    #[error("transport error: {0}")]
    Transport(String),
}

impl CacheError {
    /// Short, stable label for logging, mirroring how the source project
    /// labels error variants for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::InvalidRequest(_) => "invalid_request",
            CacheError::Conflict => "conflict",
            CacheError::NotFound => "not_found",
            CacheError::NoHealthyReplicas => "no_healthy_replicas",
            CacheError::Transport(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
