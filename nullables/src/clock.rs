//! Nullable clock — deterministic time for testing.

use statemon_utils::Clock;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to, or by `auto_step_ms` on every read.
pub struct NullClock {
    current_ms: AtomicU64,
    auto_step_ms: u64,
}

impl NullClock {
    pub fn new(initial_ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(initial_ms),
            auto_step_ms: 0,
        }
    }

    /// A clock that moves forward by `step_ms` after every reading.
    pub fn stepping(initial_ms: u64, step_ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(initial_ms),
            auto_step_ms: step_ms,
        }
    }

    /// Advance time by a number of milliseconds.
    pub fn advance(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the time to a specific value.
    pub fn set(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now_millis(&self) -> u64 {
        self.current_ms.fetch_add(self.auto_step_ms, Ordering::SeqCst)
    }
}
