use thiserror::Error;

use crate::session::Session;

/// Errors from backend API operations.
///
/// The engine handles `Network` (retry, then queue) and `Conflict` (conflict
/// workflow) internally; the remaining variants are caller-visible.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 409 -- the session was modified concurrently. Carries the
    /// server's current version from the response body.
    #[error("conflict: session was modified elsewhere")]
    Conflict { remote: Session },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("session not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("failed to parse response: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Whether this error is a transport-level failure worth retrying and,
    /// after retries are exhausted, queuing offline.
    pub fn is_connectivity_loss(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

/// Errors from offline-queue persistence (used by trait definitions in
/// arcana-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Network("connection reset".to_string());
        assert_eq!(err.to_string(), "network error: connection reset");
    }

    #[test]
    fn test_conflict_carries_remote() {
        let remote = Session {
            id: Uuid::now_v7(),
            question: Some("remote question".to_string()),
            spread: None,
            cards: Vec::new(),
            notes: None,
            updated_at: Utc::now(),
            status: SessionStatus::Draft,
        };
        let err = ApiError::Conflict {
            remote: remote.clone(),
        };
        match err {
            ApiError::Conflict { remote: r } => assert_eq!(r.id, remote.id),
            _ => panic!("expected Conflict"),
        }
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(ApiError::Network("timeout".to_string()).is_connectivity_loss());
        assert!(!ApiError::Validation("bad field".to_string()).is_connectivity_loss());
        assert!(!ApiError::NotFound.is_connectivity_loss());
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
