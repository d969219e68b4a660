//! Sync engine configuration.
//!
//! `SyncConfig` represents the `config.toml` knobs that control debounce
//! timing, forced-flush bounds, and the retry policy.

use serde::{Deserialize, Serialize};

/// Timing and retry configuration for the sync engine.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Quiet period after the last edit before a save is issued. Each new
    /// edit slides the window (pure debounce).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Hard ceiling on time-to-save measured from the first unsaved edit.
    /// Bounds data loss under continuous editing.
    #[serde(default = "default_max_flush_delay_ms")]
    pub max_flush_delay_ms: u64,

    /// Maximum save attempts per flush before the patch is queued offline.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff between save attempts.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Per-request timeout for backend calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_max_flush_delay_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_flush_delay_ms: default_max_flush_delay_ms(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
