//! Per-session debounce state and its pure transition functions.
//!
//! The orchestrator owns exactly one [`SessionState`] and advances it with
//! [`SessionState::on_poll`] and [`SessionState::after_attempt`]. Both are
//! pure: they consume nothing, touch no I/O, and return the successor state
//! alongside the decision for the caller to act on. This replaces the ad hoc
//! shared mutable flags of earlier revisions with a single owner.
//!
//! # Decisions
//!
//! - A held, unchanged tag is processed once and then reported idle once.
//! - A tag whose confirmation failed at the transport level is retried on
//!   every subsequent poll until an attempt completes.
//! - Invalid or absent reads change nothing; the caller pauses briefly.

use crate::uid::{CanonicalUid, RawRead};

/// What the orchestrator should do with one poll result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// Invalid or absent read. Pause briefly before the next poll.
    Skip,

    /// Tag already handled; emit one idle notification.
    NotifyIdle,

    /// Tag already handled and idle already reported; do nothing.
    Quiet,

    /// New work: send a loading notification, then confirm this UID.
    Process(CanonicalUid),
}

/// Debounce state for one scanning session.
///
/// Invariant: `idle_notified` is true only while no new tag differs from
/// `last_uid` and the previous attempt did not fail; any processing attempt
/// resets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    last_uid: Option<CanonicalUid>,
    failed_last_attempt: bool,
    idle_notified: bool,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the previous confirmation attempt failed at transport level.
    #[must_use]
    pub fn failed_last_attempt(&self) -> bool {
        self.failed_last_attempt
    }

    /// Decide what to do with one poll result.
    ///
    /// Returns the successor state and the decision. An unreadable value
    /// (absent tag or one too short to canonicalize) leaves the state
    /// untouched.
    #[must_use]
    pub fn on_poll(&self, read: Option<RawRead>) -> (SessionState, PollDecision) {
        let Some(raw) = read else {
            return (self.clone(), PollDecision::Skip);
        };

        let Ok(uid) = CanonicalUid::from_raw(raw) else {
            return (self.clone(), PollDecision::Skip);
        };

        let is_new = self.last_uid.as_ref() != Some(&uid);
        if !is_new && !self.failed_last_attempt {
            if self.idle_notified {
                return (self.clone(), PollDecision::Quiet);
            }
            let next = SessionState {
                idle_notified: true,
                ..self.clone()
            };
            return (next, PollDecision::NotifyIdle);
        }

        let next = SessionState {
            last_uid: Some(uid.clone()),
            failed_last_attempt: self.failed_last_attempt,
            idle_notified: false,
        };
        (next, PollDecision::Process(uid))
    }

    /// Record the outcome of a confirmation attempt.
    ///
    /// `retry` is true only for transport-class failures; server-side
    /// negatives and successes both clear the flag.
    #[must_use]
    pub fn after_attempt(&self, retry: bool) -> SessionState {
        SessionState {
            failed_last_attempt: retry,
            idle_notified: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(raw: u64) -> Option<RawRead> {
        Some(RawRead::new(raw))
    }

    #[test]
    fn test_absent_read_is_skipped_unchanged() {
        let state = SessionState::new();
        let (next, decision) = state.on_poll(None);
        assert_eq!(decision, PollDecision::Skip);
        assert_eq!(next, state);
    }

    #[test]
    fn test_short_read_is_skipped_unchanged() {
        let state = SessionState::new();
        let (next, decision) = state.on_poll(read(0xFF));
        assert_eq!(decision, PollDecision::Skip);
        assert_eq!(next, state);
    }

    #[test]
    fn test_new_tag_is_processed_once() {
        let state = SessionState::new();

        let (state, decision) = state.on_poll(read(0x1A2B3C));
        let PollDecision::Process(uid) = decision else {
            panic!("expected Process, got {decision:?}");
        };
        assert_eq!(uid.as_str(), "881A2B3C85");

        // Attempt succeeded; the held tag now reports idle exactly once.
        let state = state.after_attempt(false);
        let (state, decision) = state.on_poll(read(0x1A2B3C));
        assert_eq!(decision, PollDecision::NotifyIdle);

        let (_, decision) = state.on_poll(read(0x1A2B3C));
        assert_eq!(decision, PollDecision::Quiet);
    }

    #[test]
    fn test_transport_failure_retries_same_tag() {
        let state = SessionState::new();
        let (state, _) = state.on_poll(read(0x1A2B3C));

        let state = state.after_attempt(true);
        assert!(state.failed_last_attempt());

        // Same tag, pending retry: processed again.
        let (state, decision) = state.on_poll(read(0x1A2B3C));
        assert!(matches!(decision, PollDecision::Process(_)));

        // Success ends the retry cycle.
        let state = state.after_attempt(false);
        let (_, decision) = state.on_poll(read(0x1A2B3C));
        assert_eq!(decision, PollDecision::NotifyIdle);
    }

    #[test]
    fn test_server_negative_is_not_retried() {
        let state = SessionState::new();
        let (state, _) = state.on_poll(read(0x1A2B3C));

        // Unknown UID (500) clears the retry flag.
        let state = state.after_attempt(false);
        let (_, decision) = state.on_poll(read(0x1A2B3C));
        assert_eq!(decision, PollDecision::NotifyIdle);
    }

    #[test]
    fn test_different_tag_interrupts_idle() {
        let state = SessionState::new();
        let (state, _) = state.on_poll(read(0x1A2B3C));
        let state = state.after_attempt(false);
        let (state, _) = state.on_poll(read(0x1A2B3C));

        let (_, decision) = state.on_poll(read(0xAABBCC));
        assert!(matches!(decision, PollDecision::Process(_)));
    }

    #[test]
    fn test_absent_read_does_not_reset_idle_flag() {
        let state = SessionState::new();
        let (state, _) = state.on_poll(read(0x1A2B3C));
        let state = state.after_attempt(false);
        let (state, decision) = state.on_poll(read(0x1A2B3C));
        assert_eq!(decision, PollDecision::NotifyIdle);

        // Card lifted off the reader: nothing emitted, nothing reset.
        let (state, decision) = state.on_poll(None);
        assert_eq!(decision, PollDecision::Skip);

        let (_, decision) = state.on_poll(read(0x1A2B3C));
        assert_eq!(decision, PollDecision::Quiet);
    }
}
