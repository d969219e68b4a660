//! SQLite implementation of `MutationStore`.
//!
//! Persists queued mutations in the `pending_mutations` table using
//! INSERT OR REPLACE keyed on (session_id, seq). The patch payload is
//! stored as JSON so the schema never changes when patch fields do.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use arcana_core::queue::MutationStore;
use arcana_types::error::StoreError;
use arcana_types::patch::SessionPatch;
use arcana_types::sync::PendingMutation;

use crate::sqlite::pool::DatabasePool;

/// SQLite-backed offline queue persistence.
pub struct SqliteMutationStore {
    pool: DatabasePool,
}

impl SqliteMutationStore {
    /// Create a new mutation store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// MutationStore implementation
// ---------------------------------------------------------------------------

impl MutationStore for SqliteMutationStore {
    async fn append(&self, mutation: &PendingMutation) -> Result<(), StoreError> {
        let patch_json = serde_json::to_string(&mutation.patch)
            .map_err(|e| StoreError::Query(format!("failed to serialize patch: {e}")))?;

        sqlx::query(
            r#"INSERT OR REPLACE INTO pending_mutations (session_id, seq, patch_json, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(mutation.session_id.to_string())
        .bind(mutation.seq as i64)
        .bind(&patch_json)
        .bind(format_datetime(&mutation.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn load(&self, session_id: &Uuid) -> Result<Vec<PendingMutation>, StoreError> {
        let rows = sqlx::query(
            "SELECT seq, patch_json, created_at FROM pending_mutations WHERE session_id = ? ORDER BY seq ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut mutations = Vec::with_capacity(rows.len());
        for row in &rows {
            let seq: i64 = row
                .try_get("seq")
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let patch_json: String = row
                .try_get("patch_json")
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let created_at_str: String = row
                .try_get("created_at")
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let patch: SessionPatch = serde_json::from_str(&patch_json)
                .map_err(|e| StoreError::Query(format!("invalid patch payload: {e}")))?;

            mutations.push(PendingMutation {
                session_id: *session_id,
                patch,
                seq: seq as u64,
                created_at: parse_datetime(&created_at_str)?,
            });
        }

        Ok(mutations)
    }

    async fn remove_through(&self, session_id: &Uuid, through_seq: u64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM pending_mutations WHERE session_id = ? AND seq <= ?")
            .bind(session_id.to_string())
            .bind(through_seq as i64)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, session_id: &Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM pending_mutations WHERE session_id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_mutation(session_id: Uuid, seq: u64, question: &str) -> PendingMutation {
        PendingMutation {
            session_id,
            patch: SessionPatch::question(question),
            seq,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_load_roundtrip() {
        let store = SqliteMutationStore::new(test_pool().await);
        let id = Uuid::now_v7();

        let mutation = make_mutation(id, 1, "written offline");
        store.append(&mutation).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].seq, 1);
        assert_eq!(
            loaded[0].patch.question,
            Some(Some("written offline".to_string()))
        );
    }

    #[tokio::test]
    async fn test_load_orders_by_seq() {
        let store = SqliteMutationStore::new(test_pool().await);
        let id = Uuid::now_v7();

        store.append(&make_mutation(id, 3, "third")).await.unwrap();
        store.append(&make_mutation(id, 1, "first")).await.unwrap();
        store.append(&make_mutation(id, 2, "second")).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        let seqs: Vec<u64> = loaded.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_load_is_scoped_to_session() {
        let store = SqliteMutationStore::new(test_pool().await);
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        store.append(&make_mutation(a, 1, "mine")).await.unwrap();
        store.append(&make_mutation(b, 1, "theirs")).await.unwrap();

        let loaded = store.load(&a).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].patch.question, Some(Some("mine".to_string())));
    }

    #[tokio::test]
    async fn test_remove_through_deletes_acknowledged_prefix() {
        let store = SqliteMutationStore::new(test_pool().await);
        let id = Uuid::now_v7();
        for seq in 1..=4 {
            store
                .append(&make_mutation(id, seq, &format!("edit {seq}")))
                .await
                .unwrap();
        }

        store.remove_through(&id, 2).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        let seqs: Vec<u64> = loaded.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_clear_removes_all_for_session() {
        let store = SqliteMutationStore::new(test_pool().await);
        let id = Uuid::now_v7();
        store.append(&make_mutation(id, 1, "a")).await.unwrap();
        store.append(&make_mutation(id, 2, "b")).await.unwrap();

        store.clear(&id).await.unwrap();
        assert!(store.load(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_same_seq_upserts() {
        let store = SqliteMutationStore::new(test_pool().await);
        let id = Uuid::now_v7();

        store.append(&make_mutation(id, 1, "first try")).await.unwrap();
        store
            .append(&make_mutation(id, 1, "second try"))
            .await
            .unwrap();

        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded[0].patch.question,
            Some(Some("second try".to_string()))
        );
    }
}
