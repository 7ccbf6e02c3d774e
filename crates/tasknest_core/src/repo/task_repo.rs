//! Task-list collection repository.

use crate::model::task::TaskList;
use crate::storage::{KeyValueStore, StorageError, TASK_LISTS_KEY};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task-list persistence.
#[derive(Debug)]
pub enum RepoError {
    Storage(StorageError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task lists: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Persistence contract for the task-list collection.
pub trait TaskListRepository {
    /// Returns `None` when nothing has been persisted yet.
    fn load_lists(&self) -> RepoResult<Option<Vec<TaskList>>>;
    /// Overwrites the persisted collection.
    fn save_lists(&self, lists: &[TaskList]) -> RepoResult<()>;
}

/// Stores the collection as one JSON array under `TASK_LISTS_KEY`.
#[derive(Clone)]
pub struct KvTaskListRepository {
    storage: Arc<dyn KeyValueStore>,
}

impl KvTaskListRepository {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }
}

impl TaskListRepository for KvTaskListRepository {
    fn load_lists(&self) -> RepoResult<Option<Vec<TaskList>>> {
        let Some(raw) = self.storage.get(TASK_LISTS_KEY)? else {
            return Ok(None);
        };

        serde_json::from_str::<Vec<TaskList>>(&raw)
            .map(Some)
            .map_err(|err| RepoError::InvalidData(err.to_string()))
    }

    fn save_lists(&self, lists: &[TaskList]) -> RepoResult<()> {
        let raw = serde_json::to_string(lists).map_err(StorageError::from)?;
        self.storage.set(TASK_LISTS_KEY, &raw)?;
        Ok(())
    }
}
