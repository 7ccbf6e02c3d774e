//! Origin-scoped key-value storage boundary.
//!
//! # Responsibility
//! - Define the synchronous `get/set/remove` contract used by session and
//!   task persistence.
//! - Name the logical keys the core owns.
//!
//! # Invariants
//! - Values are opaque UTF-8 text (JSON in practice).
//! - `remove` on a missing key is not an error.
//! - Implementations are safe to share across the expiry timer task.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteKeyValueStore;

/// Storage key for the persisted session record.
pub const SESSION_KEY: &str = "authSession";
/// Storage key for the persisted task-list collection.
pub const TASK_LISTS_KEY: &str = "taskLists";

pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value backend failure.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Serialize(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "storage backend failed: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize value: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Synchronous key-value store scoped to one origin.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}
