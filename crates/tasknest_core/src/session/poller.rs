//! Periodic session poll that backs up the expiry timer.
//!
//! # Invariants
//! - The first tick runs immediately, then every `interval`.
//! - After reporting `Ended` the poll navigates to sign-in once and stops.
//! - Dropping the poller stops the background task.

use super::{PollOutcome, SessionManager, SessionResult};
use crate::navigation::{Navigator, Route};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Running poll task plus the latest published outcome.
pub struct SessionPoller {
    outcome: watch::Receiver<Option<PollOutcome>>,
    task: JoinHandle<()>,
}

impl SessionPoller {
    /// Starts polling `session` on the current tokio runtime.
    ///
    /// # Errors
    /// - `SessionError::RuntimeUnavailable` outside a tokio runtime.
    pub fn start(
        session: Arc<SessionManager>,
        interval: Duration,
        navigator: Arc<dyn Navigator>,
    ) -> SessionResult<Self> {
        let runtime = Handle::try_current()?;
        let (sender, outcome) = watch::channel(None);

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let tick = session.poll();
                sender.send_replace(Some(tick));
                if tick == PollOutcome::Ended {
                    info!("event=session_poll module=session status=ended");
                    navigator.navigate(Route::SignIn);
                    break;
                }
            }
        });

        Ok(Self { outcome, task })
    }

    /// Most recent tick result; `None` before the first tick.
    pub fn latest(&self) -> Option<PollOutcome> {
        *self.outcome.borrow()
    }

    /// Receiver that observes every published tick.
    pub fn subscribe(&self) -> watch::Receiver<Option<PollOutcome>> {
        self.outcome.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for SessionPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
