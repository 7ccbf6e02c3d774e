//! One-shot cancellable expiry timer.
//!
//! # Invariants
//! - At most one pending action exists; arming again aborts the previous one.
//! - Cancelling is idempotent.
//! - Every arm hands out a fresh `ExpiryToken`; `cancel_if` only disarms the
//!   action that token names.
//! - Dropping the timer aborts any pending action.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;

/// Identifies one arming of an `ExpiryTimer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryToken(u64);

struct PendingExpiry {
    token: ExpiryToken,
    deadline_ms: i64,
    task: JoinHandle<()>,
}

/// Holds the single outstanding deferred expiry action.
#[derive(Default)]
pub struct ExpiryTimer {
    pending: Mutex<Option<PendingExpiry>>,
    next_token: AtomicU64,
}

impl ExpiryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `action` after `delay` on the current tokio runtime.
    ///
    /// Any previously armed action is aborted first.
    ///
    /// # Errors
    /// - Returns `TryCurrentError` when called outside a tokio runtime; the
    ///   previous action is still cancelled in that case.
    pub fn arm(
        &self,
        deadline_ms: i64,
        delay: Duration,
        action: impl FnOnce() + Send + 'static,
    ) -> Result<ExpiryToken, TryCurrentError> {
        let mut pending = self.lock();
        if let Some(previous) = pending.take() {
            previous.task.abort();
        }

        let runtime = Handle::try_current()?;
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
        let token = ExpiryToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        *pending = Some(PendingExpiry {
            token,
            deadline_ms,
            task,
        });
        Ok(token)
    }

    /// Aborts the pending action. Returns whether a live action was disarmed.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(previous) => {
                let was_live = !previous.task.is_finished();
                previous.task.abort();
                was_live
            }
            None => false,
        }
    }

    /// Aborts the pending action only if it is still the one `token` armed.
    pub fn cancel_if(&self, token: ExpiryToken) -> bool {
        let mut pending = self.lock();
        if pending.as_ref().map(|current| current.token) != Some(token) {
            return false;
        }
        match pending.take() {
            Some(previous) => {
                let was_live = !previous.task.is_finished();
                previous.task.abort();
                was_live
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|pending| !pending.task.is_finished())
    }

    /// Deadline of the live pending action, if any.
    pub fn deadline_ms(&self) -> Option<i64> {
        self.lock()
            .as_ref()
            .filter(|pending| !pending.task.is_finished())
            .map(|pending| pending.deadline_ms)
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingExpiry>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        if let Some(pending) = self.lock().take() {
            pending.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExpiryTimer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counter_action(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let timer = ExpiryTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        timer
            .arm(10_000, Duration::from_secs(10), counter_action(&fired))
            .unwrap();
        assert!(timer.is_armed());
        assert_eq!(timer.deadline_ms(), Some(10_000));

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_cancels_previous_action() {
        let timer = ExpiryTimer::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        timer
            .arm(5_000, Duration::from_secs(5), counter_action(&first))
            .unwrap();
        timer
            .arm(8_000, Duration::from_secs(8), counter_action(&second))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let timer = ExpiryTimer::new();
        assert!(!timer.cancel());

        let fired = Arc::new(AtomicUsize::new(0));
        timer
            .arm(1_000, Duration::from_secs(1), counter_action(&fired))
            .unwrap();
        assert!(timer.cancel());
        assert!(!timer.cancel());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_token_does_not_cancel_newer_arm() {
        let timer = ExpiryTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let first = timer
            .arm(1_000, Duration::from_secs(1), counter_action(&fired))
            .unwrap();
        let second = timer
            .arm(2_000, Duration::from_secs(2), counter_action(&fired))
            .unwrap();
        assert_ne!(first, second);

        assert!(!timer.cancel_if(first));
        assert!(timer.is_armed());
        assert!(timer.cancel_if(second));
        assert!(!timer.is_armed());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn arming_outside_runtime_fails() {
        let timer = ExpiryTimer::new();
        assert!(timer.arm(0, Duration::ZERO, || {}).is_err());
        assert!(!timer.is_armed());
    }
}
