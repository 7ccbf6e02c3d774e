//! Core domain logic for TaskNest.
//! Session lifecycle and task-list storage shared by every UI shell.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod repo;
pub mod service;
pub mod session;
pub mod storage;

pub use auth::{
    AuthError, AuthResult, AuthStateSubscription, AuthUser, Authenticator, InMemoryAuthenticator,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::session::SessionRecord;
pub use model::task::{ListSummary, Task, TaskList, DEFAULT_LIST_ID, DEFAULT_LIST_NAME};
pub use navigation::{Navigator, Route, RouteHistory};
pub use repo::task_repo::{KvTaskListRepository, RepoError, RepoResult, TaskListRepository};
pub use service::auth_flow::{AuthFlow, AuthOutcome, AuthPhase, CredentialMode};
pub use service::dashboard::{Dashboard, DashboardError, DashboardResult};
pub use service::task_service::{TaskDetails, TaskStore};
pub use session::{
    Countdown, ExpiryToken, PollOutcome, SessionError, SessionManager, SessionPoller,
    SessionResult, SessionStatus,
};
pub use storage::{
    KeyValueStore, MemoryStore, SqliteKeyValueStore, StorageError, StorageResult, SESSION_KEY,
    TASK_LISTS_KEY,
};

/// Minimal health-check API for shell wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
