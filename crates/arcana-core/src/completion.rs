//! Session completion: validation and idempotency-token management.
//!
//! Completing a draft is only idempotent at the protocol level when the
//! same idempotency token is re-submitted, so the engine caches one token
//! per session and reuses it for every attempt against that session.

use dashmap::DashMap;
use uuid::Uuid;

use arcana_types::error::ApiError;
use arcana_types::session::{Session, SessionStatus};

/// Per-session idempotency tokens for completion submissions.
///
/// Shared between retries so a duplicate completion call cannot create a
/// duplicate finalized reading.
#[derive(Debug, Default)]
pub struct IdempotencyTokens {
    tokens: DashMap<Uuid, Uuid>,
}

impl IdempotencyTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// The token for a session, minting one on first use.
    pub fn token_for(&self, session_id: Uuid) -> Uuid {
        *self
            .tokens
            .entry(session_id)
            .or_insert_with(Uuid::now_v7)
            .value()
    }

    /// Forget a session's token once completion has succeeded.
    pub fn forget(&self, session_id: &Uuid) {
        self.tokens.remove(session_id);
    }
}

/// Check that a session is eligible for completion.
///
/// Fails with `InvalidState` for an already-completed session and
/// `Validation` when required fields (spread type, at least one drawn card)
/// are missing.
pub fn validate_completion(session: &Session) -> Result<(), ApiError> {
    if session.status == SessionStatus::Completed {
        return Err(ApiError::InvalidState(
            "session is already completed".to_string(),
        ));
    }
    if session.spread.is_none() {
        return Err(ApiError::Validation(
            "cannot complete a reading without a spread".to_string(),
        ));
    }
    if session.cards.is_empty() {
        return Err(ApiError::Validation(
            "cannot complete a reading with no cards drawn".to_string(),
        ));
    }
    Ok(())
}
