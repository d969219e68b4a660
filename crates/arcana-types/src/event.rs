//! Event types for the Arcana session event bus.
//!
//! `SessionEvent` is the unified event type broadcast by the sync engine.
//! All variants are Clone + Send + Sync for use with tokio broadcast
//! channels. The embedding UI subscribes to render save status, offline
//! state, and conflict prompts; the engine never surfaces internal errors
//! any other way.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::Session;
use crate::sync::SaveStatus;

/// Events emitted during session sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The save status of a session changed.
    StatusChanged {
        session_id: Uuid,
        status: SaveStatus,
    },

    /// A save round-trip succeeded.
    SaveSucceeded {
        session_id: Uuid,
        updated_at: chrono::DateTime<chrono::Utc>,
    },

    /// A save failed fatally (validation or invalid state).
    SaveFailed { session_id: Uuid, error: String },

    /// A concurrent modification was detected. Both versions are carried so
    /// the caller can present them side by side and resolve.
    ConflictDetected {
        session_id: Uuid,
        local: Session,
        remote: Session,
    },

    /// Replay of the offline queue has started.
    ReplayStarted { session_id: Uuid, pending: usize },

    /// The offline queue for a session has fully drained.
    QueueDrained { session_id: Uuid },

    /// The session was finalized into an immutable reading.
    SessionCompleted { session_id: Uuid, reading_id: Uuid },
}
