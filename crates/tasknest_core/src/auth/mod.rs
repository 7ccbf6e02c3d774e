//! Identity-provider boundary.
//!
//! # Responsibility
//! - Define the authenticator capability injected into auth flows.
//! - Model the provider's "current subject" stream as a cancellable
//!   subscription that always yields the latest value.
//!
//! # Invariants
//! - Provider errors carry a stable `code` plus a user-facing `message`.
//! - Dropping an `AuthStateSubscription` unsubscribes.

mod credentials;
mod memory;

pub use credentials::{check_credentials, is_valid_email};
pub use memory::InMemoryAuthenticator;

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

pub type AuthResult<T> = Result<T, AuthError>;

/// Authenticated identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub subject: String,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn new(subject: impl Into<String>, email: Option<String>) -> Self {
        Self {
            subject: subject.into(),
            email,
        }
    }
}

/// Provider-reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for AuthError {}

/// Latest-value stream of the provider's current subject.
pub struct AuthStateSubscription {
    receiver: watch::Receiver<Option<AuthUser>>,
}

impl AuthStateSubscription {
    pub fn new(receiver: watch::Receiver<Option<AuthUser>>) -> Self {
        Self { receiver }
    }

    /// Current subject, marking it as seen.
    pub fn latest(&mut self) -> Option<AuthUser> {
        self.receiver.borrow_and_update().clone()
    }

    /// Waits for the next change and returns the newest value.
    ///
    /// Intermediate values published between calls are skipped. Returns
    /// `None` once the provider has shut down.
    pub async fn next(&mut self) -> Option<Option<AuthUser>> {
        self.receiver.changed().await.ok()?;
        Some(self.latest())
    }
}

/// External identity provider capability.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthUser>;
    async fn create_account(&self, email: &str, password: &str) -> AuthResult<AuthUser>;
    async fn sign_in_with_federated_popup(&self) -> AuthResult<AuthUser>;
    async fn sign_out(&self) -> AuthResult<()>;
    fn subscribe(&self) -> AuthStateSubscription;
}
