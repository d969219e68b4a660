//! Auto-save scheduling: debounce window tracking and retry backoff.
//!
//! Pure deadline arithmetic over `tokio::time::Instant` -- the engine owns
//! the actual timers, so tests can drive everything with paused virtual
//! time instead of real clocks.

use std::time::Duration;

use tokio::time::Instant;

use arcana_types::config::SyncConfig;

/// Ceiling on a single backoff delay between save attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Tracks the sliding debounce window for the active session.
///
/// Each edit restarts the quiet period (pure debounce, not throttle); the
/// hard maximum delay is measured from the first edit of the current unsaved
/// burst so continuous editing can never postpone a save indefinitely.
#[derive(Debug, Default)]
pub struct DebounceState {
    first_edit: Option<Instant>,
    last_edit: Option<Instant>,
}

impl DebounceState {
    /// Record an edit at `now`, arming (or sliding) the window.
    pub fn record_edit(&mut self, now: Instant) {
        if self.first_edit.is_none() {
            self.first_edit = Some(now);
        }
        self.last_edit = Some(now);
    }

    /// Whether a flush is currently scheduled.
    pub fn is_armed(&self) -> bool {
        self.last_edit.is_some()
    }

    /// The moment the accumulated patch should be flushed, or `None` when
    /// no edits are pending.
    ///
    /// This is the earlier of `last_edit + debounce` and
    /// `first_edit + max_flush_delay`.
    pub fn deadline(&self, config: &SyncConfig) -> Option<Instant> {
        let first = self.first_edit?;
        let last = self.last_edit?;

        let quiet = last + Duration::from_millis(config.debounce_ms);
        let forced = first + Duration::from_millis(config.max_flush_delay_ms);
        Some(quiet.min(forced))
    }

    /// Disarm the window after a flush (or when the session goes away).
    pub fn reset(&mut self) {
        self.first_edit = None;
        self.last_edit = None;
    }
}

/// Exponential backoff delay before retry attempt `attempt` (1-based: the
/// delay taken after the first failed attempt is `attempt = 1`).
pub fn backoff_delay(config: &SyncConfig, attempt: u32) -> Duration {
    let base = Duration::from_millis(config.retry_base_delay_ms);
    let exp = attempt.saturating_sub(1).min(16);
    let delay = base.saturating_mul(1u32 << exp);
    delay.min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SyncConfig {
        SyncConfig {
            debounce_ms: 500,
            max_flush_delay_ms: 5_000,
            ..SyncConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unarmed_has_no_deadline() {
        let state = DebounceState::default();
        assert!(!state.is_armed());
        assert!(state.deadline(&config()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_edit_deadline_is_quiet_period() {
        let mut state = DebounceState::default();
        let now = Instant::now();
        state.record_edit(now);

        let deadline = state.deadline(&config()).unwrap();
        assert_eq!(deadline, now + Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_edits_slide_the_window() {
        let mut state = DebounceState::default();
        let start = Instant::now();
        state.record_edit(start);

        tokio::time::advance(Duration::from_millis(300)).await;
        state.record_edit(Instant::now());

        let deadline = state.deadline(&config()).unwrap();
        assert_eq!(deadline, start + Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_flush_caps_continuous_editing() {
        let mut state = DebounceState::default();
        let start = Instant::now();

        // Keep editing every 400ms -- the quiet period never elapses
        state.record_edit(start);
        for _ in 0..20 {
            tokio::time::advance(Duration::from_millis(400)).await;
            state.record_edit(Instant::now());
        }

        // The deadline is pinned to first_edit + max_flush_delay
        let deadline = state.deadline(&config()).unwrap();
        assert_eq!(deadline, start + Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_disarms() {
        let mut state = DebounceState::default();
        state.record_edit(Instant::now());
        state.reset();
        assert!(!state.is_armed());
        assert!(state.deadline(&config()).is_none());
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let config = SyncConfig {
            retry_base_delay_ms: 250,
            ..SyncConfig::default()
        };
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(250));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(500));
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(1_000));
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = SyncConfig {
            retry_base_delay_ms: 250,
            ..SyncConfig::default()
        };
        assert_eq!(backoff_delay(&config, 30), MAX_BACKOFF);
    }
}
