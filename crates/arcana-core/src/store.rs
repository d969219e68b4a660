//! Session store: single mutable source of truth for the active draft.
//!
//! The store is owned exclusively by the engine task. The scheduler,
//! conflict workflow, and offline queue never reach into it directly --
//! they report results back through the `mark_*` entry points.

use arcana_types::patch::SessionPatch;
use arcana_types::session::{Session, SessionStatus};
use arcana_types::sync::SaveStatus;

/// In-memory state of the reading-in-progress session.
///
/// Tracks the optimistically-updated session, the accumulated unsaved patch
/// ("dirty" state), the save status, and the monotonic local sequence
/// counter consumed by the offline queue.
#[derive(Debug)]
pub struct SessionStore {
    session: Session,
    status: SaveStatus,
    dirty: SessionPatch,
    seq: u64,
}

impl SessionStore {
    /// Wrap a session fetched from (or created on) the server.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            status: SaveStatus::Idle,
            dirty: SessionPatch::default(),
            seq: 0,
        }
    }

    /// The current local view of the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current save status.
    pub fn status(&self) -> SaveStatus {
        self.status
    }

    /// Latest local sequence number handed out by `apply_local_edit`.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether unsaved local edits are pending.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Apply a local edit optimistically and accumulate it for auto-save.
    ///
    /// Returns the new local sequence number. Never blocks.
    pub fn apply_local_edit(&mut self, patch: SessionPatch) -> u64 {
        patch.apply_to(&mut self.session);
        self.dirty.merge(patch);
        self.seq += 1;
        self.seq
    }

    /// Drain the accumulated patch for a flush. Returns `None` when there
    /// is nothing to save.
    pub fn take_dirty(&mut self) -> Option<SessionPatch> {
        if self.dirty.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.dirty))
        }
    }

    /// Re-merge an unacknowledged patch beneath edits that arrived while a
    /// save was in flight. The newer dirty fields win.
    pub fn restore_dirty(&mut self, older: SessionPatch) {
        let newer = std::mem::take(&mut self.dirty);
        self.dirty = older;
        self.dirty.merge(newer);
    }

    /// Update the save status. Returns true when the status actually changed.
    pub fn set_status(&mut self, status: SaveStatus) -> bool {
        if self.status == status {
            false
        } else {
            self.status = status;
            true
        }
    }

    /// Adopt the server's post-write state after a successful save.
    ///
    /// The server-owned fields (`updated_at`, `status`) are taken wholesale;
    /// any edits made while the save was in flight are re-applied on top so
    /// the optimistic local view is not rolled back.
    pub fn mark_saved(&mut self, server: Session) {
        self.session = server;
        self.dirty.apply_to(&mut self.session);
    }

    /// Replace local state entirely with a server-provided session,
    /// discarding unsaved local changes (load / keep_remote semantics).
    pub fn replace(&mut self, session: Session) {
        self.session = session;
        self.dirty = SessionPatch::default();
    }

    /// Mark the session completed locally so no further auto-save runs
    /// against it.
    pub fn mark_completed(&mut self) {
        self.session.status = SessionStatus::Completed;
        self.dirty = SessionPatch::default();
    }
}
