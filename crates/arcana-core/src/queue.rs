//! Offline queue: ordered buffering of mutations made without connectivity.
//!
//! The in-memory queue is owned by the engine task. Durable persistence sits
//! behind the [`MutationStore`] trait so buffered edits survive a process
//! restart; the SQLite implementation lives in arcana-infra.

use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use arcana_types::error::StoreError;
use arcana_types::sync::PendingMutation;

// ---------------------------------------------------------------------------
// MutationStore trait
// ---------------------------------------------------------------------------

/// Durable persistence for queued mutations.
///
/// Entries are appended when a save is classified as connectivity loss and
/// deleted only after server acknowledgment. Uses RPITIT consistent with
/// all async traits in this project.
pub trait MutationStore: Send + Sync {
    /// Persist a newly queued mutation.
    fn append(
        &self,
        mutation: &PendingMutation,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Load all persisted mutations for a session, ascending by `seq`.
    fn load(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<PendingMutation>, StoreError>> + Send;

    /// Delete all persisted mutations with `seq <= through_seq` (server
    /// acknowledged them).
    fn remove_through(
        &self,
        session_id: &Uuid,
        through_seq: u64,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Drop every persisted mutation for a session.
    fn clear(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// In-memory `MutationStore` for embedders that opt out of durability
/// (and for tests).
#[derive(Debug, Default)]
pub struct MemoryMutationStore {
    entries: dashmap::DashMap<Uuid, Vec<PendingMutation>>,
}

impl MemoryMutationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MutationStore for MemoryMutationStore {
    async fn append(&self, mutation: &PendingMutation) -> Result<(), StoreError> {
        self.entries
            .entry(mutation.session_id)
            .or_default()
            .push(mutation.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Uuid) -> Result<Vec<PendingMutation>, StoreError> {
        let mut entries = self
            .entries
            .get(session_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        entries.sort_by_key(|m| m.seq);
        Ok(entries)
    }

    async fn remove_through(&self, session_id: &Uuid, through_seq: u64) -> Result<(), StoreError> {
        if let Some(mut entry) = self.entries.get_mut(session_id) {
            entry.retain(|m| m.seq > through_seq);
        }
        Ok(())
    }

    async fn clear(&self, session_id: &Uuid) -> Result<(), StoreError> {
        self.entries.remove(session_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OfflineQueue
// ---------------------------------------------------------------------------

/// Per-session ordered queues of buffered mutations.
///
/// Mutations replay strictly in ascending `seq` order and leave the queue
/// only on acknowledgment -- the queue is never silently dropped.
#[derive(Debug, Default)]
pub struct OfflineQueue {
    queues: HashMap<Uuid, VecDeque<PendingMutation>>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mutation to its session's queue.
    pub fn push(&mut self, mutation: PendingMutation) {
        self.queues
            .entry(mutation.session_id)
            .or_default()
            .push_back(mutation);
    }

    /// Number of buffered mutations for a session.
    pub fn len(&self, session_id: &Uuid) -> usize {
        self.queues.get(session_id).map_or(0, VecDeque::len)
    }

    /// Whether a session has no buffered mutations.
    pub fn is_empty(&self, session_id: &Uuid) -> bool {
        self.len(session_id) == 0
    }

    /// Snapshot of a session's queue in replay order.
    pub fn pending(&self, session_id: &Uuid) -> Vec<PendingMutation> {
        self.queues
            .get(session_id)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove every mutation with `seq <= through_seq` (acknowledged).
    pub fn ack_through(&mut self, session_id: &Uuid, through_seq: u64) {
        if let Some(queue) = self.queues.get_mut(session_id) {
            queue.retain(|m| m.seq > through_seq);
            if queue.is_empty() {
                self.queues.remove(session_id);
            }
        }
    }

    /// Seed a session's queue from persisted entries (startup restore).
    /// Entries are ordered by `seq` regardless of input order.
    pub fn restore(&mut self, session_id: Uuid, mut entries: Vec<PendingMutation>) {
        if entries.is_empty() {
            return;
        }
        entries.sort_by_key(|m| m.seq);
        self.queues.insert(session_id, entries.into());
    }

    /// Drop a session's queue entirely.
    pub fn clear(&mut self, session_id: &Uuid) {
        self.queues.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_types::patch::SessionPatch;
    use chrono::Utc;

    fn mutation(session_id: Uuid, seq: u64) -> PendingMutation {
        PendingMutation {
            session_id,
            patch: SessionPatch::question(format!("edit {seq}")),
            seq,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_push_preserves_order() {
        let mut queue = OfflineQueue::new();
        let id = Uuid::now_v7();

        queue.push(mutation(id, 1));
        queue.push(mutation(id, 2));
        queue.push(mutation(id, 3));

        let pending = queue.pending(&id);
        let seqs: Vec<u64> = pending.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn test_queues_are_per_session() {
        let mut queue = OfflineQueue::new();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        queue.push(mutation(a, 1));
        queue.push(mutation(b, 1));
        queue.push(mutation(a, 2));

        assert_eq!(queue.len(&a), 2);
        assert_eq!(queue.len(&b), 1);
    }

    #[test]
    fn test_ack_through_removes_prefix_only() {
        let mut queue = OfflineQueue::new();
        let id = Uuid::now_v7();
        for seq in 1..=4 {
            queue.push(mutation(id, seq));
        }

        queue.ack_through(&id, 2);

        let seqs: Vec<u64> = queue.pending(&id).iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![3, 4]);
    }

    #[test]
    fn test_ack_all_empties_queue() {
        let mut queue = OfflineQueue::new();
        let id = Uuid::now_v7();
        queue.push(mutation(id, 1));
        queue.ack_through(&id, 1);
        assert!(queue.is_empty(&id));
    }

    #[test]
    fn test_restore_sorts_by_seq() {
        let mut queue = OfflineQueue::new();
        let id = Uuid::now_v7();

        queue.restore(id, vec![mutation(id, 3), mutation(id, 1), mutation(id, 2)]);

        let seqs: Vec<u64> = queue.pending(&id).iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryMutationStore::new();
        let id = Uuid::now_v7();

        store.append(&mutation(id, 2)).await.unwrap();
        store.append(&mutation(id, 1)).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        let seqs: Vec<u64> = loaded.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_memory_store_remove_through() {
        let store = MemoryMutationStore::new();
        let id = Uuid::now_v7();
        for seq in 1..=3 {
            store.append(&mutation(id, seq)).await.unwrap();
        }

        store.remove_through(&id, 2).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].seq, 3);
    }

    #[tokio::test]
    async fn test_memory_store_clear() {
        let store = MemoryMutationStore::new();
        let id = Uuid::now_v7();
        store.append(&mutation(id, 1)).await.unwrap();
        store.clear(&id).await.unwrap();
        assert!(store.load(&id).await.unwrap().is_empty());
    }
}
