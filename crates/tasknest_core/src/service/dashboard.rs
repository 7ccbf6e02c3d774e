//! Authenticated dashboard controller.
//!
//! # Responsibility
//! - Gate entry on a valid session, redirecting to sign-in otherwise.
//! - Own the task store, the expiry timer arming and the session poll for
//!   the lifetime of the view.
//! - Perform explicit logout.
//!
//! # Invariants
//! - Dropping the dashboard stops the poll and disarms the expiry timer it
//!   armed; a failed entry leaves no timer behind.
//! - Logout always leaves the session record purged and the host on sign-in,
//!   even when the provider sign-out fails.

use crate::auth::{AuthResult, Authenticator};
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::model::session::SessionRecord;
use crate::navigation::{Navigator, Route};
use crate::repo::task_repo::{RepoError, TaskListRepository};
use crate::service::task_service::TaskStore;
use crate::session::{
    Countdown, ExpiryToken, PollOutcome, SessionError, SessionManager, SessionPoller,
    SessionStatus,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Debug)]
pub enum DashboardError {
    Session(SessionError),
    Repo(RepoError),
}

impl Display for DashboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DashboardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SessionError> for DashboardError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<RepoError> for DashboardError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Live dashboard view state.
pub struct Dashboard<R: TaskListRepository> {
    record: SessionRecord,
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
    tasks: TaskStore<R>,
    poller: SessionPoller,
    armed: Option<ExpiryToken>,
    expiry_warning: Duration,
}

impl<R: TaskListRepository> Dashboard<R> {
    /// Enters the dashboard.
    ///
    /// Returns `Ok(None)` after redirecting to sign-in when no valid session
    /// exists. Otherwise loads tasks, arms the expiry timer and starts the
    /// poll.
    ///
    /// # Errors
    /// - Returns an error outside a tokio runtime or when seeding the task
    ///   store cannot be persisted.
    pub fn enter(
        session: Arc<SessionManager>,
        repo: R,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
        config: &CoreConfig,
    ) -> DashboardResult<Option<Self>> {
        let record = match session.validate() {
            SessionStatus::Valid(record) => record,
            SessionStatus::Invalid => {
                info!("event=dashboard_enter module=dashboard status=redirect");
                navigator.navigate(Route::SignIn);
                return Ok(None);
            }
        };
        let armed = session.schedule_expiry(record.expires_at)?;

        let started = TaskStore::load(repo, clock)
            .map_err(DashboardError::from)
            .and_then(|tasks| {
                let poller = SessionPoller::start(
                    Arc::clone(&session),
                    config.poll_interval,
                    Arc::clone(&navigator),
                )?;
                Ok((tasks, poller))
            });
        let (tasks, poller) = match started {
            Ok(parts) => parts,
            Err(err) => {
                if let Some(token) = armed {
                    session.cancel_scheduled_expiry_for(token);
                }
                warn!("event=dashboard_enter module=dashboard status=error error={err}");
                return Err(err);
            }
        };

        info!("event=dashboard_enter module=dashboard status=ok");
        Ok(Some(Self {
            record,
            session,
            navigator,
            tasks,
            poller,
            armed,
            expiry_warning: config.expiry_warning,
        }))
    }

    pub fn subject(&self) -> &str {
        &self.record.subject
    }

    pub fn session_record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn tasks(&self) -> &TaskStore<R> {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskStore<R> {
        &mut self.tasks
    }

    /// Latest countdown published by the poll; `None` before the first tick
    /// or once the session has ended.
    pub fn countdown(&self) -> Option<Countdown> {
        match self.poller.latest() {
            Some(PollOutcome::Active { remaining_secs }) => {
                Some(Countdown::new(remaining_secs, self.expiry_warning))
            }
            _ => None,
        }
    }

    /// Whether the poll has observed the session ending.
    pub fn session_ended(&self) -> bool {
        self.poller.latest() == Some(PollOutcome::Ended)
    }

    /// Explicit logout: purge the session, sign out of the provider, and
    /// return to sign-in. The provider result is returned for display.
    pub async fn logout(self, authenticator: &dyn Authenticator) -> AuthResult<()> {
        self.poller.stop();
        if let Err(err) = self.session.destroy() {
            warn!("event=logout module=dashboard status=error stage=destroy error={err}");
        }

        let result = authenticator.sign_out().await;
        match &result {
            Ok(()) => info!("event=logout module=dashboard status=ok"),
            Err(err) => warn!(
                "event=logout module=dashboard status=error stage=sign_out code={}",
                err.code
            ),
        }
        self.navigator.navigate(Route::SignIn);
        result
    }
}

impl<R: TaskListRepository> Drop for Dashboard<R> {
    fn drop(&mut self) {
        self.poller.stop();
        if let Some(token) = self.armed {
            self.session.cancel_scheduled_expiry_for(token);
        }
    }
}
