//! Offline-sync types: save status, queued mutations, conflict resolutions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::patch::SessionPatch;
use crate::session::Session;

/// Save state of the active session, driving UI feedback only.
///
/// Not persisted anywhere; derived entirely from the engine's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
    Offline,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Idle => write!(f, "idle"),
            SaveStatus::Saving => write!(f, "saving"),
            SaveStatus::Saved => write!(f, "saved"),
            SaveStatus::Error => write!(f, "error"),
            SaveStatus::Offline => write!(f, "offline"),
        }
    }
}

impl FromStr for SaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SaveStatus::Idle),
            "saving" => Ok(SaveStatus::Saving),
            "saved" => Ok(SaveStatus::Saved),
            "error" => Ok(SaveStatus::Error),
            "offline" => Ok(SaveStatus::Offline),
            other => Err(format!("invalid save status: '{other}'")),
        }
    }
}

impl Default for SaveStatus {
    fn default() -> Self {
        SaveStatus::Idle
    }
}

/// One buffered write awaiting replay.
///
/// Mutations for the same session replay strictly in ascending `seq` order
/// and are removed from the queue only after server acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    pub session_id: Uuid,
    pub patch: SessionPatch,
    /// Client-side sequence number, monotonic per session.
    pub seq: u64,
    pub created_at: DateTime<Utc>,
}

/// The caller's decision when a concurrent-modification conflict is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Re-submit the local draft, overwriting the remote version.
    KeepLocal,
    /// Discard unsaved local changes and adopt the server state.
    KeepRemote,
    /// Submit a caller-supplied merged payload.
    Merge,
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictResolution::KeepLocal => write!(f, "keep_local"),
            ConflictResolution::KeepRemote => write!(f, "keep_remote"),
            ConflictResolution::Merge => write!(f, "merge"),
        }
    }
}

/// Per-mutation outcome returned by the batch sync endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The mutation was applied; carries the session state after the write.
    Applied { seq: u64, session: Session },
    /// The mutation hit a concurrent modification; replay pauses here.
    Conflict { seq: u64, remote: Session },
    /// The mutation failed for a non-conflict reason; replay retries later.
    Failed { seq: u64, message: String },
}

impl MutationOutcome {
    /// The sequence number this outcome refers to.
    pub fn seq(&self) -> u64 {
        match self {
            MutationOutcome::Applied { seq, .. }
            | MutationOutcome::Conflict { seq, .. }
            | MutationOutcome::Failed { seq, .. } => *seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_status_roundtrip() {
        for status in [
            SaveStatus::Idle,
            SaveStatus::Saving,
            SaveStatus::Saved,
            SaveStatus::Error,
            SaveStatus::Offline,
        ] {
            let s = status.to_string();
            let parsed: SaveStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_save_status_default_is_idle() {
        assert_eq!(SaveStatus::default(), SaveStatus::Idle);
    }

    #[test]
    fn test_conflict_resolution_serde() {
        let json = serde_json::to_string(&ConflictResolution::KeepLocal).unwrap();
        assert_eq!(json, "\"keep_local\"");
        let parsed: ConflictResolution = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ConflictResolution::KeepLocal);
    }

    #[test]
    fn test_pending_mutation_serialize() {
        let mutation = PendingMutation {
            session_id: Uuid::now_v7(),
            patch: SessionPatch::question("written offline"),
            seq: 3,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&mutation).unwrap();
        assert!(json.contains("\"seq\":3"));
        assert!(json.contains("written offline"));

        let parsed: PendingMutation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mutation);
    }

    #[test]
    fn test_mutation_outcome_seq() {
        let outcome = MutationOutcome::Failed {
            seq: 7,
            message: "backend hiccup".to_string(),
        };
        assert_eq!(outcome.seq(), 7);
    }

    #[test]
    fn test_mutation_outcome_tagged_serde() {
        let outcome = MutationOutcome::Failed {
            seq: 1,
            message: "nope".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"outcome\":\"failed\""));
    }
}
