//! Cooperative cancellation for emulation sessions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot stop flag shared between the session controller and the
/// engine thread.
///
/// Clones observe the same flag. There is no reset: a session that has been
/// cancelled is finished, and the controller creates a fresh signal for the
/// next one.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns `true` if this call was the one that raised it.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let signal = CancellationSignal::new();
        let engine_side = signal.clone();
        assert!(!engine_side.is_cancelled());

        assert!(signal.cancel());
        assert!(engine_side.is_cancelled());
    }

    #[test]
    fn test_cancel_is_one_shot() {
        let signal = CancellationSignal::new();
        assert!(signal.cancel());
        assert!(!signal.cancel());
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_fresh_signals_are_independent() {
        let first = CancellationSignal::new();
        first.cancel();

        let second = CancellationSignal::new();
        assert!(!second.is_cancelled());
    }
}
