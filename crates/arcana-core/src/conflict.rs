//! Conflict workflow state and resolution payload construction.
//!
//! A save answered with HTTP 409 means someone else wrote the session
//! first. The engine parks the conflicting write here, surfaces both
//! versions to the caller, and -- once a resolution arrives -- builds the
//! payload for the resolution submission. A second 409 on that submission
//! starts a fresh cycle; there is no silent retry loop.

use arcana_types::error::ApiError;
use arcana_types::patch::SessionPatch;
use arcana_types::session::Session;
use arcana_types::sync::ConflictResolution;

/// What triggered the conflict: a debounced flush or a replayed queue entry.
#[derive(Debug, Clone)]
pub enum ConflictSource {
    /// The accumulated auto-save patch that was rejected.
    Flush { patch: SessionPatch },
    /// The queued mutation (by sequence number) that was rejected during
    /// replay. Replay stays paused until this is resolved.
    Replay { seq: u64 },
}

/// A detected conflict awaiting a caller decision.
#[derive(Debug, Clone)]
pub struct PendingConflict {
    /// The local draft at detection time (optimistic edits included).
    pub local: Session,
    /// The server's current version from the 409 response body.
    pub remote: Session,
    pub source: ConflictSource,
}

/// Full-overwrite patch capturing every user-editable field of a session.
///
/// Used for `keep_local`: the whole local draft is re-submitted against the
/// remote version's timestamp.
pub fn snapshot_patch(session: &Session) -> SessionPatch {
    SessionPatch {
        question: Some(session.question.clone()),
        spread: session.spread,
        cards: Some(session.cards.clone()),
        notes: Some(session.notes.clone()),
    }
}

/// Build the payload for a resolution submission.
///
/// - `KeepLocal` re-submits the full local draft (force-overwrite).
/// - `Merge` requires a caller-supplied merged payload; there is no
///   automatic field-level merge.
/// - `KeepRemote` needs no submission (the server already holds that
///   state) and returns `None`.
pub fn resolution_payload(
    conflict: &PendingConflict,
    resolution: ConflictResolution,
    merged: Option<SessionPatch>,
) -> Result<Option<SessionPatch>, ApiError> {
    match resolution {
        ConflictResolution::KeepRemote => Ok(None),
        ConflictResolution::KeepLocal => Ok(Some(snapshot_patch(&conflict.local))),
        ConflictResolution::Merge => match merged {
            Some(payload) if !payload.is_empty() => Ok(Some(payload)),
            _ => Err(ApiError::Validation(
                "merge resolution requires a merged payload".to_string(),
            )),
        },
    }
}
