//! Sign-in / sign-up flow controller.
//!
//! # Responsibility
//! - Drive `Unauthenticated -> Authenticating -> Authenticated` transitions.
//! - Turn a successful provider sign-in into a persisted, scheduled session.
//! - Surface provider failures as a form error without leaving the view.
//!
//! # Invariants
//! - At most one provider call is in flight per flow; extra submissions are
//!   answered with `AuthOutcome::Busy` and never reach the provider.
//! - A mount never creates or extends a session; it only restores one.
//! - Unmount only disarms an expiry timer this flow armed itself.

use crate::auth::{check_credentials, AuthResult, AuthUser, Authenticator};
use crate::model::session::SessionRecord;
use crate::navigation::{Navigator, Route};
use crate::session::{ExpiryToken, SessionManager, SessionResult, SessionStatus};
use log::{info, warn};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_CREDENTIAL_ERROR: &str = "Authentication failed";
const DEFAULT_FEDERATED_ERROR: &str = "Failed to sign in with federated provider";

/// Which credential form is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    SignIn,
    SignUp,
}

/// Observable flow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    /// Mount has not finished checking for an existing session.
    Checking,
    Unauthenticated { error: Option<String> },
    Authenticating,
    Authenticated(SessionRecord),
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(SessionRecord),
    Rejected(String),
    /// Another submission is still in flight.
    Busy,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Controller behind the sign-in view.
pub struct AuthFlow {
    authenticator: Arc<dyn Authenticator>,
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
    mode: Mutex<CredentialMode>,
    phase: Mutex<AuthPhase>,
    armed: Mutex<Option<ExpiryToken>>,
    in_flight: AtomicBool,
}

impl AuthFlow {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        session: Arc<SessionManager>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            authenticator,
            session,
            navigator,
            mode: Mutex::new(CredentialMode::SignIn),
            phase: Mutex::new(AuthPhase::Checking),
            armed: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> AuthPhase {
        lock(&self.phase).clone()
    }

    pub fn mode(&self) -> CredentialMode {
        *lock(&self.mode)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// View entry: restores a still-valid session for the provider's current
    /// subject and redirects to the dashboard, otherwise shows the form.
    ///
    /// The expiry timer is armed only when the session is actually restored.
    ///
    /// # Errors
    /// - Returns an error when a valid session cannot be scheduled.
    pub fn mount(&self) -> SessionResult<AuthPhase> {
        let current_user = self.authenticator.subscribe().latest();
        let status = self.session.validate();

        let phase = match (current_user, status) {
            (Some(_), SessionStatus::Valid(record)) => {
                let token = self.session.schedule_expiry(record.expires_at)?;
                self.remember_armed(token);
                info!("event=auth_restore module=auth status=ok");
                self.navigator.navigate(Route::Dashboard {
                    subject: record.subject.clone(),
                });
                AuthPhase::Authenticated(record)
            }
            _ => AuthPhase::Unauthenticated { error: None },
        };
        self.set_phase(phase.clone());
        Ok(phase)
    }

    /// View exit: disarms the session timer this view armed, if it is still
    /// the pending one. A timer re-armed elsewhere (e.g. by the dashboard)
    /// is left running.
    pub fn unmount(&self) {
        if let Some(token) = lock(&self.armed).take() {
            self.session.cancel_scheduled_expiry_for(token);
        }
    }

    /// Switches between sign-in and sign-up and clears any form error.
    pub fn toggle_mode(&self) -> CredentialMode {
        let mut mode = lock(&self.mode);
        *mode = match *mode {
            CredentialMode::SignIn => CredentialMode::SignUp,
            CredentialMode::SignUp => CredentialMode::SignIn,
        };

        let mut phase = lock(&self.phase);
        if let AuthPhase::Unauthenticated { error } = &mut *phase {
            *error = None;
        }
        *mode
    }

    /// Submits the email/password form in the current mode.
    pub async fn submit(&self, email: &str, password: &str) -> AuthOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return AuthOutcome::Busy;
        };

        if let Err(message) = check_credentials(email, password) {
            return self.reject(message.to_string());
        }

        let email = email.trim();
        match self.mode() {
            CredentialMode::SignIn => {
                self.attempt(
                    DEFAULT_CREDENTIAL_ERROR,
                    self.authenticator.sign_in_with_password(email, password),
                )
                .await
            }
            CredentialMode::SignUp => {
                self.attempt(
                    DEFAULT_CREDENTIAL_ERROR,
                    self.authenticator.create_account(email, password),
                )
                .await
            }
        }
    }

    /// Runs the federated popup sign-in.
    pub async fn sign_in_federated(&self) -> AuthOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return AuthOutcome::Busy;
        };

        self.attempt(
            DEFAULT_FEDERATED_ERROR,
            self.authenticator.sign_in_with_federated_popup(),
        )
        .await
    }

    async fn attempt(
        &self,
        default_error: &'static str,
        call: impl Future<Output = AuthResult<AuthUser>>,
    ) -> AuthOutcome {
        self.set_phase(AuthPhase::Authenticating);

        let user = match call.await {
            Ok(user) => user,
            Err(err) => {
                info!(
                    "event=auth_attempt module=auth status=rejected code={}",
                    err.code
                );
                let message = if err.message.trim().is_empty() {
                    default_error.to_string()
                } else {
                    err.message
                };
                return self.reject(message);
            }
        };

        let record = match self.session.create(&user.subject) {
            Ok(record) => record,
            Err(err) => {
                warn!("event=auth_attempt module=auth status=error stage=session error={err}");
                return self.reject(format!("Could not save session: {err}"));
            }
        };
        match self.session.schedule_expiry(record.expires_at) {
            Ok(token) => self.remember_armed(token),
            Err(err) => {
                warn!("event=auth_attempt module=auth status=degraded stage=schedule error={err}");
            }
        }

        info!("event=auth_attempt module=auth status=ok");
        self.set_phase(AuthPhase::Authenticated(record.clone()));
        self.navigator.navigate(Route::Dashboard {
            subject: record.subject.clone(),
        });
        AuthOutcome::Authenticated(record)
    }

    fn reject(&self, message: String) -> AuthOutcome {
        self.set_phase(AuthPhase::Unauthenticated {
            error: Some(message.clone()),
        });
        AuthOutcome::Rejected(message)
    }

    fn remember_armed(&self, token: Option<ExpiryToken>) {
        *lock(&self.armed) = token;
    }

    fn set_phase(&self, phase: AuthPhase) {
        *lock(&self.phase) = phase;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
