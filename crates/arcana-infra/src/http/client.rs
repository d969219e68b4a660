//! HttpSessionApi -- concrete [`SessionApi`] implementation over reqwest.
//!
//! Talks JSON to the session backend. Optimistic-concurrency conflicts come
//! back as HTTP 409 with the server's current session in the response body;
//! everything else maps onto the [`ApiError`] taxonomy.
//!
//! The bearer token is wrapped in [`secrecy::SecretString`] and is never
//! logged or included in `Debug` output.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use arcana_core::api::{CompletionFields, NewSession, SessionApi};
use arcana_types::config::SyncConfig;
use arcana_types::error::ApiError;
use arcana_types::patch::SessionPatch;
use arcana_types::session::{Reading, Session};
use arcana_types::sync::{ConflictResolution, MutationOutcome, PendingMutation};

use super::types::{
    CompleteSessionRequest, PatchSessionRequest, ResolveConflictRequest, SyncRequest, SyncResponse,
};

/// What a 409 means on a given endpoint: a concurrent-modification conflict
/// (save paths) or an illegal lifecycle transition (completion).
#[derive(Debug, Clone, Copy)]
enum ConflictKind {
    OptimisticConcurrency,
    InvalidState,
}

/// HTTP client for the session REST API.
pub struct HttpSessionApi {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<SecretString>,
}

impl HttpSessionApi {
    /// Create a new client against the given base URL.
    pub fn new(base_url: impl Into<String>, config: &SyncConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    /// Attach a bearer token for authenticated backends.
    pub fn with_auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and map non-2xx statuses onto the error taxonomy.
    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        conflict: ConflictKind,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body, conflict))
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

// HttpSessionApi intentionally does NOT derive Debug: the SecretString
// field keeps the token out of accidental prints, and omitting Debug
// entirely removes the remaining surface.

/// Map a non-2xx response onto [`ApiError`].
fn classify_error(status: StatusCode, body: &str, conflict: ConflictKind) -> ApiError {
    match status {
        StatusCode::CONFLICT => match conflict {
            ConflictKind::OptimisticConcurrency => {
                match serde_json::from_str::<Session>(body) {
                    Ok(remote) => ApiError::Conflict { remote },
                    Err(e) => ApiError::Deserialization(format!(
                        "conflict response did not carry a session: {e}"
                    )),
                }
            }
            ConflictKind::InvalidState => ApiError::InvalidState(body.to_string()),
        },
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
        s if s.is_client_error() => ApiError::Validation(body.to_string()),
        // 5xx is transient from the client's perspective: retry, then queue
        s => ApiError::Network(format!("HTTP {s}: {body}")),
    }
}

impl SessionApi for HttpSessionApi {
    async fn create_session(&self, draft: &NewSession) -> Result<Session, ApiError> {
        let response = self
            .execute(
                self.client.post(self.url("/sessions")).json(draft),
                ConflictKind::OptimisticConcurrency,
            )
            .await?;
        Self::parse(response).await
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Session, ApiError> {
        let response = self
            .execute(
                self.client.get(self.url(&format!("/sessions/{session_id}"))),
                ConflictKind::OptimisticConcurrency,
            )
            .await?;
        Self::parse(response).await
    }

    async fn patch_session(
        &self,
        session_id: &Uuid,
        patch: &SessionPatch,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<Session, ApiError> {
        let body = PatchSessionRequest {
            patch,
            expected_updated_at,
        };
        let response = self
            .execute(
                self.client
                    .patch(self.url(&format!("/sessions/{session_id}")))
                    .json(&body),
                ConflictKind::OptimisticConcurrency,
            )
            .await?;
        Self::parse(response).await
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), ApiError> {
        self.execute(
            self.client
                .delete(self.url(&format!("/sessions/{session_id}"))),
            ConflictKind::OptimisticConcurrency,
        )
        .await?;
        Ok(())
    }

    async fn complete_session(
        &self,
        session_id: &Uuid,
        fields: &CompletionFields,
        idempotency_token: Uuid,
    ) -> Result<Reading, ApiError> {
        let body = CompleteSessionRequest {
            fields,
            idempotency_token,
        };
        let response = self
            .execute(
                self.client
                    .post(self.url(&format!("/sessions/{session_id}/complete")))
                    .json(&body),
                // A 409 here means the session is already finalized, not an
                // optimistic-concurrency race.
                ConflictKind::InvalidState,
            )
            .await?;
        Self::parse(response).await
    }

    async fn sync_batch(
        &self,
        session_id: &Uuid,
        mutations: &[PendingMutation],
    ) -> Result<Vec<MutationOutcome>, ApiError> {
        let body = SyncRequest {
            session_id: *session_id,
            mutations,
        };
        let response = self
            .execute(
                self.client.post(self.url("/sessions/sync")).json(&body),
                ConflictKind::OptimisticConcurrency,
            )
            .await?;
        let parsed: SyncResponse = Self::parse(response).await?;
        Ok(parsed.outcomes)
    }

    async fn resolve_conflict(
        &self,
        session_id: &Uuid,
        resolution: ConflictResolution,
        payload: &SessionPatch,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<Session, ApiError> {
        let body = ResolveConflictRequest {
            session_id: *session_id,
            resolution,
            payload,
            expected_updated_at,
        };
        let response = self
            .execute(
                self.client
                    .post(self.url("/sessions/resolve-conflict"))
                    .json(&body),
                ConflictKind::OptimisticConcurrency,
            )
            .await?;
        Self::parse(response).await
    }
}
