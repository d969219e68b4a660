//! SessionApi trait definition.
//!
//! The backend REST API surface consumed by the sync engine. Implementations
//! live in arcana-infra (e.g., `HttpSessionApi`). Uses native async fn in
//! traits (RPITIT, Rust 2024 edition).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arcana_types::error::ApiError;
use arcana_types::patch::SessionPatch;
use arcana_types::session::{Reading, Session, SpreadType};
use arcana_types::sync::{ConflictResolution, MutationOutcome, PendingMutation};

/// Initial fields for session creation.
///
/// A session is created on first user interaction -- spread selection or the
/// first card draw -- so either field may be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<SpreadType>,
}

/// Final fields supplied when a draft is completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

/// Backend API operations for reading sessions.
///
/// Every write that can race a concurrent editor carries an
/// `expected_updated_at` timestamp; the server answers with
/// [`ApiError::Conflict`] when its stored `updated_at` differs.
pub trait SessionApi: Send + Sync {
    /// Create a new draft session. The server assigns the id and the
    /// initial `updated_at`.
    fn create_session(
        &self,
        draft: &NewSession,
    ) -> impl std::future::Future<Output = Result<Session, ApiError>> + Send;

    /// Fetch the current server-side state of a session.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Session, ApiError>> + Send;

    /// Apply a partial patch under optimistic concurrency.
    fn patch_session(
        &self,
        session_id: &Uuid,
        patch: &SessionPatch,
        expected_updated_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Session, ApiError>> + Send;

    /// Discard a draft session (soft delete).
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;

    /// Finalize a draft into an immutable reading.
    ///
    /// Idempotent only when the caller supplies the same `idempotency_token`
    /// across retries.
    fn complete_session(
        &self,
        session_id: &Uuid,
        fields: &CompletionFields,
        idempotency_token: Uuid,
    ) -> impl std::future::Future<Output = Result<Reading, ApiError>> + Send;

    /// Submit an ordered batch of buffered mutations. The server applies
    /// them in order and reports a per-mutation outcome.
    fn sync_batch(
        &self,
        session_id: &Uuid,
        mutations: &[PendingMutation],
    ) -> impl std::future::Future<Output = Result<Vec<MutationOutcome>, ApiError>> + Send;

    /// Submit a conflict resolution. `payload` carries the fields to write
    /// for `keep_local` and `merge`; `expected_updated_at` must be the
    /// remote version's timestamp from the conflict that is being resolved.
    fn resolve_conflict(
        &self,
        session_id: &Uuid,
        resolution: ConflictResolution,
        payload: &SessionPatch,
        expected_updated_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Session, ApiError>> + Send;
}
