//! Sync engine: the single-writer event loop tying the store, scheduler,
//! conflict workflow, and offline queue together.
//!
//! The engine runs as one tokio task selecting over a bounded command
//! channel, the debounce/replay deadline, connectivity transitions, and a
//! cancellation token. All session state is owned by the task; the cloneable
//! [`SyncHandle`] is the public API and reports progress through the event
//! bus, never through shared mutable state.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use arcana_types::config::SyncConfig;
use arcana_types::error::ApiError;
use arcana_types::event::SessionEvent;
use arcana_types::patch::SessionPatch;
use arcana_types::session::{Reading, Session, SessionStatus};
use arcana_types::sync::{ConflictResolution, MutationOutcome, PendingMutation, SaveStatus};

use crate::api::{CompletionFields, SessionApi};
use crate::completion::{validate_completion, IdempotencyTokens};
use crate::conflict::{resolution_payload, ConflictSource, PendingConflict};
use crate::connectivity::ConnectivityMonitor;
use crate::event::EventBus;
use crate::queue::{MutationStore, OfflineQueue};
use crate::scheduler::{backoff_delay, DebounceState};
use crate::store::SessionStore;

/// Buffer size for the engine command channel.
const COMMAND_BUFFER: usize = 64;

/// Buffer size for the session event bus.
const EVENT_BUFFER: usize = 256;

/// Placeholder sleep horizon used when no deadline is armed.
const FAR_FUTURE: Duration = Duration::from_secs(3_600);

/// Errors surfaced by [`SyncHandle`] operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine task has shut down.
    #[error("sync engine is no longer running")]
    Closed,

    /// The command buffer is full (the engine is falling behind).
    #[error("sync engine command buffer is full")]
    Busy,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Point-in-time view of the engine's state, for UI rendering and tests.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub session: Session,
    pub status: SaveStatus,
    /// Buffered mutations awaiting replay for the active session.
    pub queued: usize,
    /// The conflict awaiting a caller decision, if any.
    pub conflict: Option<PendingConflict>,
}

enum Command {
    Edit(SessionPatch),
    Flush {
        reply: oneshot::Sender<()>,
    },
    Resolve {
        resolution: ConflictResolution,
        merged: Option<SessionPatch>,
        reply: oneshot::Sender<Result<(), ApiError>>,
    },
    Complete {
        fields: CompletionFields,
        reply: oneshot::Sender<Result<Reading, ApiError>>,
    },
    Switch {
        session_id: Uuid,
        reply: oneshot::Sender<Result<(), ApiError>>,
    },
    Discard {
        reply: oneshot::Sender<Result<(), ApiError>>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
}

#[derive(Debug, Clone, Copy)]
enum WakeKind {
    Flush,
    Replay,
}

// ---------------------------------------------------------------------------
// SyncHandle
// ---------------------------------------------------------------------------

/// Cloneable handle to a running sync engine.
#[derive(Clone)]
pub struct SyncHandle {
    cmd_tx: mpsc::Sender<Command>,
    bus: EventBus,
    cancel: CancellationToken,
}

impl SyncHandle {
    /// Apply a local edit. Non-blocking: the edit is applied optimistically
    /// by the engine and scheduled for auto-save.
    pub fn apply_edit(&self, patch: SessionPatch) -> Result<(), EngineError> {
        self.cmd_tx
            .try_send(Command::Edit(patch))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => EngineError::Busy,
                mpsc::error::TrySendError::Closed(_) => EngineError::Closed,
            })
    }

    /// Force an immediate flush of any accumulated patch.
    pub async fn flush_now(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Flush { reply }).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Resolve the pending conflict. For `Merge` the caller supplies the
    /// merged payload; for the other resolutions `merged` is ignored.
    pub async fn resolve_conflict(
        &self,
        resolution: ConflictResolution,
        merged: Option<SessionPatch>,
    ) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Resolve {
            resolution,
            merged,
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    /// Finalize the active draft into an immutable reading.
    pub async fn complete(&self, fields: CompletionFields) -> Result<Reading, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Complete { fields, reply }).await?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    /// Switch to a different session: the old session's pending debounce is
    /// cancelled and its unsaved state flushed first.
    pub async fn switch_session(&self, session_id: Uuid) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Switch { session_id, reply }).await?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    /// Discard the active draft (soft delete on the server).
    pub async fn discard(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Discard { reply }).await?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    /// Current engine state.
    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    /// Stop the engine. Unsaved state is flushed best-effort before exit.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn send(&self, cmd: Command) -> Result<(), EngineError> {
        self.cmd_tx.send(cmd).await.map_err(|_| EngineError::Closed)
    }
}

// ---------------------------------------------------------------------------
// SyncEngine
// ---------------------------------------------------------------------------

/// The engine task state. Constructed via [`SyncEngine::start`].
pub struct SyncEngine<A, M, C> {
    api: A,
    mutations: M,
    connectivity: C,
    config: SyncConfig,
    store: SessionStore,
    queue: OfflineQueue,
    debounce: DebounceState,
    tokens: IdempotencyTokens,
    pending_conflict: Option<PendingConflict>,
    bus: EventBus,
    replay_attempts: u32,
    next_replay_at: Option<Instant>,
    discarded: bool,
}

impl<A, M, C> SyncEngine<A, M, C>
where
    A: SessionApi + 'static,
    M: MutationStore + 'static,
    C: ConnectivityMonitor + 'static,
{
    /// Spawn the engine task for a session and return its handle.
    ///
    /// The session is typically freshly created via
    /// [`SessionApi::create_session`] or loaded via
    /// [`SessionApi::get_session`] by the embedder.
    pub fn start(
        api: A,
        mutations: M,
        connectivity: C,
        config: SyncConfig,
        session: Session,
    ) -> SyncHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let bus = EventBus::new(EVENT_BUFFER);
        let cancel = CancellationToken::new();

        let engine = SyncEngine {
            api,
            mutations,
            connectivity,
            config,
            store: SessionStore::new(session),
            queue: OfflineQueue::new(),
            debounce: DebounceState::default(),
            tokens: IdempotencyTokens::new(),
            pending_conflict: None,
            bus: bus.clone(),
            replay_attempts: 0,
            next_replay_at: None,
            discarded: false,
        };

        tokio::spawn(engine.run(cmd_rx, cancel.clone()));

        SyncHandle {
            cmd_tx,
            bus,
            cancel,
        }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>, cancel: CancellationToken) {
        let mut online_rx = self.connectivity.watch();

        self.restore_persisted_queue().await;

        loop {
            let wake = self.next_wake();
            let sleep_at = wake
                .map(|(at, _)| at)
                .unwrap_or_else(|| Instant::now() + FAR_FUTURE);

            tokio::select! {
                _ = cancel.cancelled() => {
                    // Best-effort flush so shutdown never loses edits silently
                    self.flush_dirty().await;
                    break;
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        self.flush_dirty().await;
                        break;
                    }
                },
                changed = online_rx.changed() => {
                    if changed.is_ok() {
                        let online = *online_rx.borrow();
                        self.on_connectivity_change(online).await;
                    }
                }
                _ = tokio::time::sleep_until(sleep_at), if wake.is_some() => {
                    match wake.map(|(_, kind)| kind) {
                        Some(WakeKind::Flush) => self.flush_dirty().await,
                        Some(WakeKind::Replay) => self.replay_queue().await,
                        None => {}
                    }
                }
            }
        }
    }

    /// Seed the queue from mutations persisted by a previous process.
    async fn restore_persisted_queue(&mut self) {
        let session_id = self.store.session().id;
        match self.mutations.load(&session_id).await {
            Ok(persisted) if !persisted.is_empty() => {
                info!(
                    count = persisted.len(),
                    %session_id,
                    "restored buffered mutations from a previous run"
                );
                self.queue.restore(session_id, persisted);
                if self.connectivity.is_online() {
                    self.replay_queue().await;
                } else {
                    self.set_status(SaveStatus::Offline);
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, %session_id, "failed to load persisted mutations");
            }
        }
    }

    /// The next timer wakeup, if any. Flush and replay deadlines are both
    /// suppressed while a conflict awaits resolution.
    fn next_wake(&self) -> Option<(Instant, WakeKind)> {
        if self.pending_conflict.is_some() {
            return None;
        }
        let mut wake = self
            .debounce
            .deadline(&self.config)
            .map(|at| (at, WakeKind::Flush));
        if let Some(at) = self.next_replay_at {
            if wake.map_or(true, |(w, _)| at < w) {
                wake = Some((at, WakeKind::Replay));
            }
        }
        wake
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Edit(patch) => self.handle_edit(patch).await,
            Command::Flush { reply } => {
                self.flush_dirty().await;
                let _ = reply.send(());
            }
            Command::Resolve {
                resolution,
                merged,
                reply,
            } => self.handle_resolution(resolution, merged, reply).await,
            Command::Complete { fields, reply } => self.handle_complete(fields, reply).await,
            Command::Switch { session_id, reply } => self.handle_switch(session_id, reply).await,
            Command::Discard { reply } => self.handle_discard(reply).await,
            Command::Snapshot { reply } => {
                let _ = reply.send(EngineSnapshot {
                    session: self.store.session().clone(),
                    status: self.store.status(),
                    queued: self.queue.len(&self.store.session().id),
                    conflict: self.pending_conflict.clone(),
                });
            }
        }
    }

    async fn handle_edit(&mut self, patch: SessionPatch) {
        let session_id = self.store.session().id;
        if self.discarded || self.store.session().status == SessionStatus::Completed {
            self.bus.publish(SessionEvent::SaveFailed {
                session_id,
                error: "session is no longer editable".to_string(),
            });
            return;
        }
        if patch.is_empty() {
            return;
        }

        self.store.apply_local_edit(patch);

        if self.connectivity.is_online() {
            self.debounce.record_edit(Instant::now());
        } else {
            // Offline edits skip the debounce window: each one becomes a
            // queued mutation immediately, preserving edit order.
            if let Some(dirty) = self.store.take_dirty() {
                self.queue_offline(session_id, dirty).await;
            }
        }
    }

    /// Flush the accumulated patch, if any. Resets the debounce window.
    async fn flush_dirty(&mut self) {
        self.debounce.reset();
        if self.pending_conflict.is_some() {
            // Saving a stale draft over an unresolved conflict would just
            // conflict again; edits keep accumulating until resolution.
            return;
        }
        if self.discarded || self.store.session().status == SessionStatus::Completed {
            return;
        }
        let Some(patch) = self.store.take_dirty() else {
            return;
        };
        let session_id = self.store.session().id;
        let expected = self.store.session().updated_at;

        if !self.connectivity.is_online() {
            self.queue_offline(session_id, patch).await;
            return;
        }

        self.set_status(SaveStatus::Saving);
        match self.save_with_retry(&session_id, &patch, expected).await {
            Ok(server) => {
                if server.id != session_id {
                    // Stale response from a session we already switched away
                    // from; drop it.
                    warn!(%session_id, stale = %server.id, "discarding save result for inactive session");
                    return;
                }
                self.store.mark_saved(server);
                self.set_status(SaveStatus::Saved);
                self.bus.publish(SessionEvent::SaveSucceeded {
                    session_id,
                    updated_at: self.store.session().updated_at,
                });
            }
            Err(ApiError::Conflict { remote }) => {
                self.enter_conflict(remote, ConflictSource::Flush { patch });
            }
            Err(err) if err.is_connectivity_loss() => {
                warn!(%session_id, error = %err, "save failed after retries, buffering offline");
                self.queue_offline(session_id, patch).await;
            }
            Err(err) => {
                self.set_status(SaveStatus::Error);
                self.bus.publish(SessionEvent::SaveFailed {
                    session_id,
                    error: err.to_string(),
                });
            }
        }
    }

    async fn save_with_retry(
        &self,
        session_id: &Uuid,
        patch: &SessionPatch,
        expected: chrono::DateTime<Utc>,
    ) -> Result<Session, ApiError> {
        let mut attempt = 1;
        loop {
            match self.api.patch_session(session_id, patch, expected).await {
                Err(err) if err.is_connectivity_loss() && attempt < self.config.max_attempts => {
                    let delay = backoff_delay(&self.config, attempt);
                    debug!(%session_id, attempt, ?delay, "transient save failure, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn queue_offline(&mut self, session_id: Uuid, patch: SessionPatch) {
        let mutation = PendingMutation {
            session_id,
            patch,
            seq: self.store.seq(),
            created_at: Utc::now(),
        };
        if let Err(err) = self.mutations.append(&mutation).await {
            warn!(%session_id, error = %err, "failed to persist queued mutation");
        }
        self.queue.push(mutation);
        self.set_status(SaveStatus::Offline);
    }

    async fn on_connectivity_change(&mut self, online: bool) {
        let session_id = self.store.session().id;
        if online {
            info!(%session_id, "connectivity restored");
            self.replay_attempts = 0;
            if !self.queue.is_empty(&session_id) {
                self.replay_queue().await;
            } else if self.store.status() == SaveStatus::Offline {
                self.set_status(SaveStatus::Idle);
            }
        } else {
            info!(%session_id, "connectivity lost");
            self.set_status(SaveStatus::Offline);
        }
    }

    /// Replay the buffered queue through the batch sync endpoint.
    ///
    /// The server applies mutations in order and reports per-mutation
    /// outcomes; the acknowledged prefix leaves the queue, a conflict pauses
    /// replay, and any other failure schedules a retry of the remainder.
    async fn replay_queue(&mut self) {
        self.next_replay_at = None;
        if self.pending_conflict.is_some() || !self.connectivity.is_online() {
            return;
        }
        let session_id = self.store.session().id;
        let pending = self.queue.pending(&session_id);
        if pending.is_empty() {
            return;
        }

        self.bus.publish(SessionEvent::ReplayStarted {
            session_id,
            pending: pending.len(),
        });
        self.set_status(SaveStatus::Saving);

        match self.api.sync_batch(&session_id, &pending).await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    match outcome {
                        MutationOutcome::Applied { seq, session } => {
                            self.ack_mutation(&session_id, seq).await;
                            if session.id == session_id {
                                self.store.mark_saved(session);
                            }
                        }
                        MutationOutcome::Conflict { seq, remote } => {
                            self.enter_conflict(remote, ConflictSource::Replay { seq });
                            return;
                        }
                        MutationOutcome::Failed { seq, message } => {
                            warn!(%session_id, seq, %message, "mutation rejected during replay, will retry remainder");
                            self.schedule_replay_retry();
                            return;
                        }
                    }
                }
                if self.queue.is_empty(&session_id) {
                    self.replay_attempts = 0;
                    self.set_status(SaveStatus::Saved);
                    self.bus.publish(SessionEvent::QueueDrained { session_id });
                }
            }
            Err(err) if err.is_connectivity_loss() => {
                warn!(%session_id, error = %err, "replay failed, waiting for connectivity");
                self.set_status(SaveStatus::Offline);
            }
            Err(err) => {
                warn!(%session_id, error = %err, "replay failed, will retry");
                self.schedule_replay_retry();
            }
        }
    }

    async fn ack_mutation(&mut self, session_id: &Uuid, seq: u64) {
        self.queue.ack_through(session_id, seq);
        if let Err(err) = self.mutations.remove_through(session_id, seq).await {
            warn!(%session_id, seq, error = %err, "failed to prune persisted mutations");
        }
    }

    fn schedule_replay_retry(&mut self) {
        self.replay_attempts += 1;
        let delay = backoff_delay(&self.config, self.replay_attempts);
        self.next_replay_at = Some(Instant::now() + delay);
        self.set_status(SaveStatus::Error);
    }

    fn enter_conflict(&mut self, remote: Session, source: ConflictSource) {
        let local = self.store.session().clone();
        let session_id = local.id;
        self.pending_conflict = Some(PendingConflict {
            local: local.clone(),
            remote: remote.clone(),
            source,
        });
        self.set_status(SaveStatus::Error);
        self.bus.publish(SessionEvent::ConflictDetected {
            session_id,
            local,
            remote,
        });
    }

    async fn handle_resolution(
        &mut self,
        resolution: ConflictResolution,
        merged: Option<SessionPatch>,
        reply: oneshot::Sender<Result<(), ApiError>>,
    ) {
        let Some(conflict) = self.pending_conflict.take() else {
            let _ = reply.send(Err(ApiError::InvalidState(
                "no conflict awaiting resolution".to_string(),
            )));
            return;
        };
        let session_id = self.store.session().id;

        let payload = match resolution_payload(&conflict, resolution, merged) {
            Ok(payload) => payload,
            Err(err) => {
                self.pending_conflict = Some(conflict);
                let _ = reply.send(Err(err));
                return;
            }
        };

        match payload {
            // keep_remote: adopt the server state, discard unsaved changes
            None => {
                if let ConflictSource::Replay { seq } = conflict.source {
                    self.ack_mutation(&session_id, seq).await;
                }
                self.store.replace(conflict.remote);
                self.set_status(SaveStatus::Saved);
                let _ = reply.send(Ok(()));
                self.resume_after_resolution().await;
            }
            // keep_local / merge: submit against the remote's timestamp
            Some(payload) => {
                self.set_status(SaveStatus::Saving);
                let expected = conflict.remote.updated_at;
                match self
                    .api
                    .resolve_conflict(&session_id, resolution, &payload, expected)
                    .await
                {
                    Ok(server) => {
                        if let ConflictSource::Replay { seq } = conflict.source {
                            self.ack_mutation(&session_id, seq).await;
                        }
                        self.store.mark_saved(server);
                        self.set_status(SaveStatus::Saved);
                        self.bus.publish(SessionEvent::SaveSucceeded {
                            session_id,
                            updated_at: self.store.session().updated_at,
                        });
                        let _ = reply.send(Ok(()));
                        self.resume_after_resolution().await;
                    }
                    Err(ApiError::Conflict { remote }) => {
                        // The resolution itself raced another writer: this
                        // starts a fresh conflict cycle, never a silent retry.
                        let response = ApiError::Conflict {
                            remote: remote.clone(),
                        };
                        self.enter_conflict(remote, conflict.source);
                        let _ = reply.send(Err(response));
                    }
                    Err(err) => {
                        // Resolution not applied; the conflict is still open.
                        self.pending_conflict = Some(conflict);
                        self.set_status(SaveStatus::Error);
                        let _ = reply.send(Err(err));
                    }
                }
            }
        }
    }

    async fn resume_after_resolution(&mut self) {
        if self.store.is_dirty() {
            self.debounce.record_edit(Instant::now());
        }
        let session_id = self.store.session().id;
        if !self.queue.is_empty(&session_id) && self.connectivity.is_online() {
            self.replay_queue().await;
        }
    }

    async fn handle_complete(
        &mut self,
        fields: CompletionFields,
        reply: oneshot::Sender<Result<Reading, ApiError>>,
    ) {
        if self.pending_conflict.is_some() {
            let _ = reply.send(Err(ApiError::InvalidState(
                "cannot complete with an unresolved conflict".to_string(),
            )));
            return;
        }
        if self.discarded {
            let _ = reply.send(Err(ApiError::InvalidState(
                "session has been discarded".to_string(),
            )));
            return;
        }
        if let Err(err) = validate_completion(self.store.session()) {
            let _ = reply.send(Err(err));
            return;
        }
        let session_id = self.store.session().id;

        // The finalized reading must capture the last saved state, so any
        // accumulated patch goes out first.
        self.flush_dirty().await;
        if self.pending_conflict.is_some() {
            let _ = reply.send(Err(ApiError::InvalidState(
                "conflict detected while flushing before completion".to_string(),
            )));
            return;
        }
        if !self.queue.is_empty(&session_id) {
            let _ = reply.send(Err(ApiError::Network(
                "buffered offline edits are not yet synced".to_string(),
            )));
            return;
        }

        let token = self.tokens.token_for(session_id);
        match self.api.complete_session(&session_id, &fields, token).await {
            Ok(reading) => {
                self.store.mark_completed();
                self.tokens.forget(&session_id);
                self.debounce.reset();
                self.set_status(SaveStatus::Saved);
                self.bus.publish(SessionEvent::SessionCompleted {
                    session_id,
                    reading_id: reading.id,
                });
                let _ = reply.send(Ok(reading));
            }
            // The token is retained so a retry cannot double-finalize
            Err(err) => {
                let _ = reply.send(Err(err));
            }
        }
    }

    async fn handle_switch(
        &mut self,
        new_session_id: Uuid,
        reply: oneshot::Sender<Result<(), ApiError>>,
    ) {
        // Cancel the old session's pending debounce, flushing first so
        // navigation never silently drops edits.
        self.flush_dirty().await;

        match self.api.get_session(&new_session_id).await {
            Ok(session) => {
                self.debounce.reset();
                self.pending_conflict = None;
                self.discarded = false;
                self.replay_attempts = 0;
                self.next_replay_at = None;
                self.store = SessionStore::new(session);

                match self.mutations.load(&new_session_id).await {
                    Ok(persisted) => self.queue.restore(new_session_id, persisted),
                    Err(err) => {
                        warn!(%new_session_id, error = %err, "failed to load persisted mutations");
                    }
                }
                let _ = reply.send(Ok(()));

                if !self.queue.is_empty(&new_session_id) && self.connectivity.is_online() {
                    self.replay_queue().await;
                }
            }
            // The old session stays active on failure
            Err(err) => {
                let _ = reply.send(Err(err));
            }
        }
    }

    async fn handle_discard(&mut self, reply: oneshot::Sender<Result<(), ApiError>>) {
        let session_id = self.store.session().id;
        match self.api.delete_session(&session_id).await {
            Ok(()) => {
                self.queue.clear(&session_id);
                if let Err(err) = self.mutations.clear(&session_id).await {
                    warn!(%session_id, error = %err, "failed to clear persisted mutations");
                }
                self.debounce.reset();
                self.pending_conflict = None;
                self.discarded = true;
                self.set_status(SaveStatus::Idle);
                let _ = reply.send(Ok(()));
            }
            Err(err) => {
                let _ = reply.send(Err(err));
            }
        }
    }

    fn set_status(&mut self, status: SaveStatus) {
        if self.store.set_status(status) {
            self.bus.publish(SessionEvent::StatusChanged {
                session_id: self.store.session().id,
                status,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
