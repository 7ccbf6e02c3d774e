//! Session lifecycle: validation, creation, scheduled expiry and polling.
//!
//! # Responsibility
//! - Own the single persisted session record under `SESSION_KEY`.
//! - Enforce expiry through two independent paths: a one-shot timer and a
//!   periodic poll.
//!
//! # Invariants
//! - A record with `expires_at <= now` is never reported as valid and is
//!   purged as soon as it is observed.
//! - Malformed records are purged and treated as absent.
//! - Timer and poll purges are idempotent and converge on "record absent".
//! - Sessions are never extended silently; only `create` writes a record.

mod countdown;
mod expiry;
mod poller;

pub use countdown::{format_countdown, Countdown};
pub use expiry::{ExpiryTimer, ExpiryToken};
pub use poller::SessionPoller;

use crate::clock::{millis_until, Clock};
use crate::config::CoreConfig;
use crate::model::session::SessionRecord;
use crate::storage::{KeyValueStore, StorageError, SESSION_KEY};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    Storage(StorageError),
    /// Timer or poll work was requested outside a tokio runtime.
    RuntimeUnavailable,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::RuntimeUnavailable => {
                write!(f, "session timers require a running tokio runtime")
            }
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::RuntimeUnavailable => None,
        }
    }
}

impl From<StorageError> for SessionError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<tokio::runtime::TryCurrentError> for SessionError {
    fn from(_: tokio::runtime::TryCurrentError) -> Self {
        Self::RuntimeUnavailable
    }
}

/// Result of validating the stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Valid(SessionRecord),
    Invalid,
}

impl SessionStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            Self::Valid(record) => Some(record),
            Self::Invalid => None,
        }
    }
}

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Session still valid; whole seconds left, rounded up.
    Active { remaining_secs: u64 },
    /// Session is gone; the host should leave the authenticated view.
    Ended,
}

enum StoredSession {
    Absent,
    Malformed,
    Present(SessionRecord),
}

/// Shared handle to the persisted record, cloneable into timer tasks.
#[derive(Clone)]
struct RecordSlot {
    storage: Arc<dyn KeyValueStore>,
}

impl RecordSlot {
    fn read(&self) -> StoredSession {
        let raw = match self.storage.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return StoredSession::Absent,
            Err(err) => {
                warn!("event=session_read module=session status=error error={err}");
                return StoredSession::Absent;
            }
        };

        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => StoredSession::Present(record),
            Err(_) => StoredSession::Malformed,
        }
    }

    fn write(&self, record: &SessionRecord) -> SessionResult<()> {
        let raw = serde_json::to_string(record).map_err(StorageError::from)?;
        self.storage.set(SESSION_KEY, &raw)?;
        Ok(())
    }

    fn purge(&self, reason: &'static str) {
        match self.storage.remove(SESSION_KEY) {
            Ok(()) => info!("event=session_purge module=session status=ok reason={reason}"),
            Err(err) => warn!(
                "event=session_purge module=session status=error reason={reason} error={err}"
            ),
        }
    }

    /// Purges the record if it expires no later than `deadline_ms`.
    ///
    /// A record with a later expiry belongs to a newer sign-in and survives.
    fn expire_through(&self, deadline_ms: i64, reason: &'static str) {
        match self.read() {
            StoredSession::Absent => {
                debug!("event=session_expire module=session status=skipped reason=absent");
            }
            StoredSession::Malformed => self.purge("malformed"),
            StoredSession::Present(record) if record.expires_at <= deadline_ms => {
                self.purge(reason);
            }
            StoredSession::Present(_) => {
                debug!("event=session_expire module=session status=skipped reason=superseded");
            }
        }
    }
}

/// Owner of the persisted session record and its expiry timer.
pub struct SessionManager {
    slot: RecordSlot,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    expiry: ExpiryTimer,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: &CoreConfig) -> Self {
        Self {
            slot: RecordSlot { storage },
            clock,
            ttl: config.session_ttl,
            expiry: ExpiryTimer::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Reads and validates the stored record.
    ///
    /// Expired or malformed records are purged before returning `Invalid`.
    pub fn validate(&self) -> SessionStatus {
        match self.slot.read() {
            StoredSession::Absent => SessionStatus::Invalid,
            StoredSession::Malformed => {
                self.slot.purge("malformed");
                SessionStatus::Invalid
            }
            StoredSession::Present(record) if record.is_expired_at(self.clock.now_ms()) => {
                self.slot.purge("expired");
                self.expiry.cancel();
                SessionStatus::Invalid
            }
            StoredSession::Present(record) => SessionStatus::Valid(record),
        }
    }

    /// Persists a fresh record for `subject`, replacing any prior one.
    pub fn create(&self, subject: &str) -> SessionResult<SessionRecord> {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let record = SessionRecord::new(subject, self.clock.now_ms().saturating_add(ttl_ms));
        self.slot.write(&record)?;
        info!(
            "event=session_create module=session status=ok ttl_secs={}",
            self.ttl.as_secs()
        );
        Ok(record)
    }

    /// Arms the one-shot purge for `expires_at`, replacing any pending one.
    ///
    /// Purges immediately when `expires_at` has already passed, in which case
    /// no token is returned. The token lets the caller disarm exactly this
    /// arming later without touching one made by another view.
    ///
    /// # Errors
    /// - `SessionError::RuntimeUnavailable` outside a tokio runtime.
    pub fn schedule_expiry(&self, expires_at: i64) -> SessionResult<Option<ExpiryToken>> {
        let now = self.clock.now_ms();
        if expires_at <= now {
            self.expiry.cancel();
            self.slot.expire_through(expires_at, "expired");
            return Ok(None);
        }

        let slot = self.slot.clone();
        let delay = millis_until(now, expires_at);
        let token = self.expiry.arm(expires_at, delay, move || {
            slot.expire_through(expires_at, "timer");
        })?;
        debug!(
            "event=session_schedule module=session status=ok delay_ms={}",
            delay.as_millis()
        );
        Ok(Some(token))
    }

    /// Disarms the pending purge; safe to call when nothing is armed.
    pub fn cancel_scheduled_expiry(&self) -> bool {
        self.expiry.cancel()
    }

    /// Disarms the pending purge only if `token` still names it.
    pub fn cancel_scheduled_expiry_for(&self, token: ExpiryToken) -> bool {
        let cancelled = self.expiry.cancel_if(token);
        if !cancelled {
            debug!("event=session_schedule module=session status=skipped reason=stale_token");
        }
        cancelled
    }

    pub fn has_scheduled_expiry(&self) -> bool {
        self.expiry.is_armed()
    }

    /// Validates the stored record and arms the timer for its remaining lifetime.
    pub fn restore_and_schedule(&self) -> SessionResult<SessionStatus> {
        let status = self.validate();
        if let SessionStatus::Valid(record) = &status {
            self.schedule_expiry(record.expires_at)?;
        }
        Ok(status)
    }

    /// Removes the record and disarms the timer. Used by explicit logout.
    pub fn destroy(&self) -> SessionResult<()> {
        self.expiry.cancel();
        self.slot.storage.remove(SESSION_KEY)?;
        info!("event=session_destroy module=session status=ok");
        Ok(())
    }

    /// One poll tick: re-reads the record and reports the countdown.
    pub fn poll(&self) -> PollOutcome {
        match self.slot.read() {
            StoredSession::Absent => PollOutcome::Ended,
            StoredSession::Malformed => {
                self.slot.purge("malformed");
                PollOutcome::Ended
            }
            StoredSession::Present(record) => {
                let now = self.clock.now_ms();
                if record.is_expired_at(now) {
                    self.slot.purge("poll");
                    PollOutcome::Ended
                } else {
                    PollOutcome::Active {
                        remaining_secs: record.remaining_secs_at(now),
                    }
                }
            }
        }
    }
}
