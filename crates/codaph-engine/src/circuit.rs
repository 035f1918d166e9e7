use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// A consecutive-failure circuit breaker with no half-open state and no
/// auto-recovery: once opened, it stays open for the remainder of the
/// owning pipeline's lifetime.
pub struct CircuitBreaker {
    threshold: u32,
    consecutive_failures: AtomicU32,
    open: AtomicBool,
}

impl CircuitBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive_failures: AtomicU32::new(0),
            open: AtomicBool::new(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }

    /// Record a failure; returns `true` exactly once, on the call that
    /// first crosses the threshold and opens the circuit.
    pub fn record_failure(&self) -> bool {
        let count = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= self.threshold {
            let just_opened = !self.open.swap(true, Ordering::SeqCst);
            if just_opened {
                tracing::warn!(threshold = self.threshold, "remote memory circuit opened; remote writes suspended");
            }
            just_opened
        } else {
            false
        }
    }
}
