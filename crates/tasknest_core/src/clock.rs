//! Wall-clock abstraction.
//!
//! # Responsibility
//! - Provide epoch-millisecond time to session and task logic.
//! - Allow tests to pin and advance time deterministically.
//!
//! # Invariants
//! - `now_ms()` is Unix epoch milliseconds, never negative for real clocks.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of current wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Clock backed by `SystemTime::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            Err(_) => 0,
        }
    }
}

/// Manually driven clock for tests and replay tooling.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let delta_ms = i64::try_from(delta.as_millis()).unwrap_or(i64::MAX);
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Converts a signed millisecond span into a `Duration`, clamping negatives to zero.
pub(crate) fn millis_until(now_ms: i64, deadline_ms: i64) -> Duration {
    let remaining = deadline_ms.saturating_sub(now_ms);
    Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
}
