//! Failure classification for page interactions.
//!
//! A long-running farm session sees a steady stream of page noise: popups
//! stealing clicks, elements re-rendering mid-wait, labels briefly gone.
//! None of that may kill a worker. What must kill a worker, cleanly and
//! alone, is structural loss: the window closing, the platform throwing
//! something unrecognizable. The supervisor draws that line.

use crate::page::PageError;

/// Consecutive retryable failures before the session is reinitialized.
pub const MAX_ATTEMPTS: u32 = 3;

/// Recovery action for a failed interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Dismiss any popup overlay, then re-run the interaction.
    Dismiss,
    /// Re-run the same interaction.
    Retry,
    /// Log and move on without this interaction.
    Skip,
    /// Reload the page and redo the first-load handshake.
    Reinitialize,
    /// The session is gone; stop the worker cleanly.
    Stop,
    /// Unrecoverable; terminate this worker's loop.
    Abort,
}

/// Tracks consecutive retryable failures and maps each failure to a
/// [`Recovery`].
#[derive(Debug)]
pub struct Supervisor {
    max_attempts: u32,
    attempts: u32,
}

impl Supervisor {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: 0,
        }
    }

    /// Consecutive retryable failures absorbed since the last success.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Call after a fully successful iteration.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn classify(&mut self, err: &PageError) -> Recovery {
        match err {
            PageError::Obstructed(_) | PageError::NotInteractable(_) => Recovery::Dismiss,
            PageError::NotFound { .. } | PageError::Stale(_) => {
                self.attempts += 1;
                if self.attempts >= self.max_attempts {
                    self.attempts = 0;
                    Recovery::Reinitialize
                } else {
                    Recovery::Retry
                }
            }
            PageError::Missing(_) => Recovery::Skip,
            PageError::WindowClosed => Recovery::Stop,
            PageError::Connection(_) => {
                self.attempts = 0;
                Recovery::Reinitialize
            }
            PageError::Other(_) => Recovery::Abort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> PageError {
        PageError::NotFound {
            selector: "#x".into(),
            timeout_ms: 1000,
        }
    }

    #[test]
    fn obstruction_dismisses_without_counting() {
        let mut sup = Supervisor::new(MAX_ATTEMPTS);
        assert_eq!(sup.classify(&PageError::Obstructed("#x".into())), Recovery::Dismiss);
        assert_eq!(sup.classify(&PageError::NotInteractable("#x".into())), Recovery::Dismiss);
        assert_eq!(sup.attempts(), 0);
    }

    #[test]
    fn timeouts_escalate_to_reinit_at_limit() {
        let mut sup = Supervisor::new(3);
        assert_eq!(sup.classify(&not_found()), Recovery::Retry);
        assert_eq!(sup.classify(&not_found()), Recovery::Retry);
        assert_eq!(sup.classify(&not_found()), Recovery::Reinitialize);
        // Counter was reset by the escalation.
        assert_eq!(sup.classify(&not_found()), Recovery::Retry);
    }

    #[test]
    fn stale_references_count_like_timeouts() {
        let mut sup = Supervisor::new(3);
        assert_eq!(sup.classify(&PageError::Stale("#x".into())), Recovery::Retry);
        assert_eq!(sup.classify(&not_found()), Recovery::Retry);
        assert_eq!(sup.classify(&PageError::Stale("#x".into())), Recovery::Reinitialize);
    }

    #[test]
    fn success_resets_the_counter() {
        let mut sup = Supervisor::new(3);
        sup.classify(&not_found());
        sup.classify(&not_found());
        sup.reset();
        assert_eq!(sup.classify(&not_found()), Recovery::Retry);
    }

    #[test]
    fn absence_skips_without_counting() {
        let mut sup = Supervisor::new(3);
        assert_eq!(sup.classify(&PageError::Missing("#x".into())), Recovery::Skip);
        assert_eq!(sup.attempts(), 0);
    }

    #[test]
    fn window_loss_stops() {
        let mut sup = Supervisor::new(3);
        assert_eq!(sup.classify(&PageError::WindowClosed), Recovery::Stop);
    }

    #[test]
    fn connection_loss_reinitializes_and_resets() {
        let mut sup = Supervisor::new(3);
        sup.classify(&not_found());
        assert_eq!(
            sup.classify(&PageError::Connection("socket hung up".into())),
            Recovery::Reinitialize
        );
        assert_eq!(sup.attempts(), 0);
    }

    #[test]
    fn unclassified_failures_abort() {
        let mut sup = Supervisor::new(3);
        assert_eq!(sup.classify(&PageError::Other("boom".into())), Recovery::Abort);
    }
}
