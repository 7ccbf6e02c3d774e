//! Task and task-list models.
//!
//! # Invariants
//! - `Task::id` is unique within its list; `TaskList::id` is unique within
//!   the collection.
//! - `TaskList::tasks` keeps insertion order; completion ordering is a
//!   presentation concern (see `TaskList::display_order`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the list created on first load.
pub const DEFAULT_LIST_ID: &str = "default-1";
/// Display name of the list created on first load.
pub const DEFAULT_LIST_NAME: &str = "My Tasks";

/// One actionable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Task {
    /// Creates a pending task with a generated id.
    pub fn new(title: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: format!("task-{}", Uuid::new_v4()),
            title: title.into(),
            completed: false,
            due_date: None,
            notes: None,
            created_at,
        }
    }
}

/// A named, ordered collection of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskList {
    /// Creates an empty list with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(format!("list-{}", Uuid::new_v4()), name)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// The list seeded into empty storage.
    pub fn default_list() -> Self {
        Self::with_id(DEFAULT_LIST_ID, DEFAULT_LIST_NAME)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub(crate) fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    /// Tasks in presentation order: pending first, then completed.
    ///
    /// Stable within each group and never reorders `self.tasks`.
    pub fn display_order(&self) -> Vec<&Task> {
        let (pending, completed): (Vec<&Task>, Vec<&Task>) =
            self.tasks.iter().partition(|task| !task.completed);
        pending.into_iter().chain(completed).collect()
    }

    pub fn summary(&self) -> ListSummary {
        ListSummary {
            completed: self.tasks.iter().filter(|task| task.completed).count(),
            total: self.tasks.len(),
        }
    }
}

/// Completion counts shown in a list header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListSummary {
    pub completed: usize,
    pub total: usize,
}

impl std::fmt::Display for ListSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} completed", self.completed, self.total)
    }
}
