//! In-process identity provider.
//!
//! Accounts live in a map for the lifetime of the value. Error codes mirror
//! the ones hosted providers report so UI paths can be exercised offline.

use super::{AuthError, AuthResult, AuthStateSubscription, AuthUser, Authenticator};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

const MIN_PASSWORD_CHARS: usize = 6;

struct Account {
    password: String,
    subject: String,
}

/// Map-backed authenticator with a broadcast current-subject channel.
pub struct InMemoryAuthenticator {
    accounts: Mutex<HashMap<String, Account>>,
    federated_user: Mutex<Option<AuthUser>>,
    current: watch::Sender<Option<AuthUser>>,
    latency: Duration,
}

impl Default for InMemoryAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            federated_user: Mutex::new(None),
            current,
            latency: Duration::ZERO,
        }
    }

    /// Delays every remote call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Registers an account directly and returns its subject.
    pub fn register(&self, email: &str, password: &str) -> String {
        let subject = Uuid::new_v4().to_string();
        lock(&self.accounts).insert(
            normalize_email(email),
            Account {
                password: password.to_string(),
                subject: subject.clone(),
            },
        );
        subject
    }

    /// Sets the identity returned by the federated popup; `None` simulates the
    /// user closing the popup.
    pub fn set_federated_user(&self, user: Option<AuthUser>) {
        *lock(&self.federated_user) = user;
    }

    /// Publishes `user` as the current subject without a sign-in call.
    pub fn set_current_user(&self, user: Option<AuthUser>) {
        self.current.send_replace(user);
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn publish(&self, user: &AuthUser) {
        self.current.send_replace(Some(user.clone()));
    }
}

#[async_trait]
impl Authenticator for InMemoryAuthenticator {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        self.simulate_latency().await;
        let key = normalize_email(email);
        let user = {
            let accounts = lock(&self.accounts);
            match accounts.get(&key) {
                Some(account) if account.password == password => {
                    AuthUser::new(account.subject.clone(), Some(key))
                }
                _ => {
                    return Err(AuthError::new(
                        "auth/invalid-credential",
                        "Invalid email or password.",
                    ))
                }
            }
        };
        self.publish(&user);
        Ok(user)
    }

    async fn create_account(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        self.simulate_latency().await;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::new(
                "auth/weak-password",
                "Password should be at least 6 characters.",
            ));
        }

        let key = normalize_email(email);
        let user = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(&key) {
                return Err(AuthError::new(
                    "auth/email-already-in-use",
                    "An account already exists for this email.",
                ));
            }
            let subject = Uuid::new_v4().to_string();
            accounts.insert(
                key.clone(),
                Account {
                    password: password.to_string(),
                    subject: subject.clone(),
                },
            );
            AuthUser::new(subject, Some(key))
        };
        self.publish(&user);
        Ok(user)
    }

    async fn sign_in_with_federated_popup(&self) -> AuthResult<AuthUser> {
        self.simulate_latency().await;
        let user = lock(&self.federated_user).clone().ok_or_else(|| {
            AuthError::new(
                "auth/popup-closed-by-user",
                "The sign-in popup was closed before completing.",
            )
        })?;
        self.publish(&user);
        Ok(user)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.simulate_latency().await;
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> AuthStateSubscription {
        AuthStateSubscription::new(self.current.subscribe())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
