//! Wire types for the session REST API.
//!
//! These are HTTP-specific request/response structures. They are NOT the
//! domain types from arcana-types -- those are transport-agnostic; these
//! describe exactly what goes over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arcana_core::api::CompletionFields;
use arcana_types::patch::SessionPatch;
use arcana_types::sync::{ConflictResolution, MutationOutcome, PendingMutation};

/// Body for `PATCH /sessions/{id}`.
///
/// The patch fields are flattened alongside the optimistic-concurrency
/// timestamp the server compares against its stored `updated_at`.
#[derive(Debug, Serialize)]
pub struct PatchSessionRequest<'a> {
    #[serde(flatten)]
    pub patch: &'a SessionPatch,
    pub expected_updated_at: DateTime<Utc>,
}

/// Body for `POST /sessions/{id}/complete`.
#[derive(Debug, Serialize)]
pub struct CompleteSessionRequest<'a> {
    #[serde(flatten)]
    pub fields: &'a CompletionFields,
    pub idempotency_token: Uuid,
}

/// Body for `POST /sessions/sync`.
#[derive(Debug, Serialize)]
pub struct SyncRequest<'a> {
    pub session_id: Uuid,
    pub mutations: &'a [PendingMutation],
}

/// Response body for `POST /sessions/sync`.
#[derive(Debug, Deserialize)]
pub struct SyncResponse {
    pub outcomes: Vec<MutationOutcome>,
}

/// Body for `POST /sessions/resolve-conflict`.
#[derive(Debug, Serialize)]
pub struct ResolveConflictRequest<'a> {
    pub session_id: Uuid,
    pub resolution: ConflictResolution,
    pub payload: &'a SessionPatch,
    pub expected_updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_request_flattens_fields() {
        let patch = SessionPatch::question("why?");
        let request = PatchSessionRequest {
            patch: &patch,
            expected_updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&request).unwrap();

        // Patch fields sit at the top level, not nested under "patch"
        assert_eq!(json["question"], "why?");
        assert!(json.get("patch").is_none());
        assert!(json.get("expected_updated_at").is_some());
    }

    #[test]
    fn test_complete_request_carries_token() {
        let fields = CompletionFields {
            interpretation: Some("new beginnings".to_string()),
        };
        let token = Uuid::now_v7();
        let request = CompleteSessionRequest {
            fields: &fields,
            idempotency_token: token,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["interpretation"], "new beginnings");
        assert_eq!(json["idempotency_token"], token.to_string());
    }

    #[test]
    fn test_resolve_request_shape() {
        let payload = SessionPatch::notes("merged");
        let request = ResolveConflictRequest {
            session_id: Uuid::now_v7(),
            resolution: ConflictResolution::Merge,
            payload: &payload,
            expected_updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["resolution"], "merge");
        assert_eq!(json["payload"]["notes"], "merged");
    }

    #[test]
    fn test_sync_response_parses_outcomes() {
        let body = r#"{
            "outcomes": [
                {"outcome": "failed", "seq": 4, "message": "storage busy"}
            ]
        }"#;
        let response: SyncResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.outcomes.len(), 1);
        assert!(matches!(
            response.outcomes[0],
            MutationOutcome::Failed { seq: 4, .. }
        ));
    }
}
