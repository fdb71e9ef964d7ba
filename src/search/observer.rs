//! Passive progress notification and cooperative cancellation.
//!
//! Discovery runs block on network I/O, so presentation layers run them on
//! their own task and listen through [`ProgressObserver`]: one-way
//! notifications only, the core never calls back into UI code. Cancellation
//! is a flag checked between loop iterations, never mid-request: the
//! in-flight call completes and whatever accumulated is returned.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One-way progress notifications from a discovery workflow.
///
/// All methods have no-op defaults; implement only what the presentation
/// layer cares about. Implementations must not block.
pub trait ProgressObserver {
    /// Human-readable status line ("searching accounts...").
    fn on_status(&self, _text: &str) {}

    /// Overall progress in percent (0..=100).
    fn on_progress(&self, _percent: u8) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {}

/// Cooperative cancellation flag shared between a workflow and its driver.
///
/// Cloning shares the flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a fresh, uncancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_starts_clear() {
        assert!(!CancelFlag::new().is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let flag = CancelFlag::new();
        let shared = flag.clone();
        shared.cancel();
        assert!(flag.is_cancelled());
    }
}
