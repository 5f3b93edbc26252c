//! The process-wide `QUOTA_EXHAUSTED` flag (§5 "Global mutable state",
//! §4.5 "Quota exhaustion"). Preserved explicitly rather than hidden in a
//! module cache, per §9's redesign note.
//!
//! One `QuotaState` is constructed per process (held by the single
//! `AiGateway` instance and shared with anything that needs to read it, e.g.
//! a future admin-reset CLI command) — tests construct their own so they
//! don't interfere with each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// init = false at process start; set on first quota signal; reset only by
/// operator action (`reset`) or process restart (a fresh `QuotaState`).
#[derive(Clone)]
pub struct QuotaState(Arc<AtomicBool>);

impl QuotaState {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_exhausted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set_exhausted(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Manual operator action to clear the flag (§4.5).
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for QuotaState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unexhausted() {
        assert!(!QuotaState::new().is_exhausted());
    }

    #[test]
    fn set_then_reset() {
        let state = QuotaState::new();
        state.set_exhausted();
        assert!(state.is_exhausted());
        state.reset();
        assert!(!state.is_exhausted());
    }

    #[test]
    fn clones_share_state() {
        let state = QuotaState::new();
        let clone = state.clone();
        clone.set_exhausted();
        assert!(state.is_exhausted());
    }
}
