//! Task-store use-case service.
//!
//! # Responsibility
//! - Own the in-memory task-list collection and the current list selection.
//! - Persist the full collection after every accepted mutation.
//!
//! # Invariants
//! - The collection always holds at least one list.
//! - Rejected inputs (blank title/name, unknown ids, deleting the last list)
//!   change nothing and write nothing.
//! - A mutation whose write fails is rolled back, so memory never leads
//!   storage.
//! - The selection, when set, always names an existing list.

use crate::clock::Clock;
use crate::model::task::{Task, TaskList};
use crate::repo::task_repo::{RepoError, RepoResult, TaskListRepository};
use log::{info, warn};
use std::sync::Arc;

/// Optional task fields that can be edited after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDetails {
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

/// Collection and selection as they were before a mutation.
struct Snapshot {
    lists: Vec<TaskList>,
    selected: Option<String>,
}

/// Task-list collection with immediate write-through persistence.
pub struct TaskStore<R: TaskListRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
    lists: Vec<TaskList>,
    selected: Option<String>,
}

impl<R: TaskListRepository> TaskStore<R> {
    /// Loads the persisted collection, seeding the default list when storage
    /// is empty, unreadable, or holds no lists. Selects the first list.
    ///
    /// # Errors
    /// - Returns an error only when seeding the default list fails to persist.
    pub fn load(repo: R, clock: Arc<dyn Clock>) -> RepoResult<Self> {
        let loaded = match repo.load_lists() {
            Ok(Some(lists)) if !lists.is_empty() => Some(lists),
            Ok(Some(_)) | Ok(None) => None,
            Err(RepoError::InvalidData(message)) => {
                warn!("event=tasks_load module=tasks status=reset reason=invalid_data detail={message}");
                None
            }
            Err(err) => {
                warn!("event=tasks_load module=tasks status=reset reason=read_failed error={err}");
                None
            }
        };

        let lists = match loaded {
            Some(lists) => lists,
            None => {
                let seeded = vec![TaskList::default_list()];
                repo.save_lists(&seeded)?;
                info!("event=tasks_seed module=tasks status=ok");
                seeded
            }
        };

        info!(
            "event=tasks_load module=tasks status=ok lists={}",
            lists.len()
        );
        let selected = lists.first().map(|list| list.id.clone());
        Ok(Self {
            repo,
            clock,
            lists,
            selected,
        })
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn list(&self, list_id: &str) -> Option<&TaskList> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    pub fn selected_list_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_list(&self) -> Option<&TaskList> {
        self.selected
            .as_deref()
            .and_then(|list_id| self.list(list_id))
    }

    /// Selects `list_id`. Returns `false` and keeps the selection for unknown ids.
    pub fn select_list(&mut self, list_id: &str) -> bool {
        if self.list(list_id).is_none() {
            return false;
        }
        self.selected = Some(list_id.to_string());
        true
    }

    /// Appends a pending task to `list_id`.
    ///
    /// Returns the new task id, or `None` when the title is blank or the list
    /// is unknown. The stored title is trimmed.
    pub fn add_task(&mut self, list_id: &str, title: &str) -> RepoResult<Option<String>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }
        if self.list(list_id).is_none() {
            return Ok(None);
        }

        let before = self.snapshot();
        let task = Task::new(title, self.clock.now_ms());
        let task_id = task.id.clone();
        if let Some(list) = self.list_mut(list_id) {
            list.tasks.push(task);
        }
        self.persist("task_add", before)?;
        Ok(Some(task_id))
    }

    /// Flips `completed`. Returns whether a task was found.
    pub fn toggle_task(&mut self, list_id: &str, task_id: &str) -> RepoResult<bool> {
        if self.task(list_id, task_id).is_none() {
            return Ok(false);
        }

        let before = self.snapshot();
        if let Some(task) = self.task_mut(list_id, task_id) {
            task.completed = !task.completed;
        }
        self.persist("task_toggle", before)?;
        Ok(true)
    }

    /// Removes a task. Returns whether a task was removed.
    pub fn delete_task(&mut self, list_id: &str, task_id: &str) -> RepoResult<bool> {
        if self.task(list_id, task_id).is_none() {
            return Ok(false);
        }

        let before = self.snapshot();
        if let Some(list) = self.list_mut(list_id) {
            list.tasks.retain(|task| task.id != task_id);
        }
        self.persist("task_delete", before)?;
        Ok(true)
    }

    /// Replaces a task's due date and notes. Blank values clear the field.
    pub fn set_task_details(
        &mut self,
        list_id: &str,
        task_id: &str,
        details: TaskDetails,
    ) -> RepoResult<bool> {
        if self.task(list_id, task_id).is_none() {
            return Ok(false);
        }

        let before = self.snapshot();
        if let Some(task) = self.task_mut(list_id, task_id) {
            task.due_date = non_blank(details.due_date);
            task.notes = non_blank(details.notes);
        }
        self.persist("task_details", before)?;
        Ok(true)
    }

    /// Appends an empty list and selects it.
    ///
    /// Returns the new list id, or `None` for a blank name.
    pub fn add_list(&mut self, name: &str) -> RepoResult<Option<String>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let before = self.snapshot();
        let list = TaskList::new(name);
        let list_id = list.id.clone();
        self.lists.push(list);
        self.selected = Some(list_id.clone());
        self.persist("list_add", before)?;
        Ok(Some(list_id))
    }

    /// Removes a list unless it is the last one.
    ///
    /// When the removed list was selected, selection moves to the first
    /// remaining list.
    pub fn delete_list(&mut self, list_id: &str) -> RepoResult<bool> {
        if self.lists.len() <= 1 {
            return Ok(false);
        }
        let Some(index) = self.lists.iter().position(|list| list.id == list_id) else {
            return Ok(false);
        };

        let before = self.snapshot();
        self.lists.remove(index);
        if self.selected.as_deref() == Some(list_id) {
            self.selected = self.lists.first().map(|list| list.id.clone());
        }
        self.persist("list_delete", before)?;
        Ok(true)
    }

    fn list_mut(&mut self, list_id: &str) -> Option<&mut TaskList> {
        self.lists.iter_mut().find(|list| list.id == list_id)
    }

    fn task(&self, list_id: &str, task_id: &str) -> Option<&Task> {
        self.list(list_id).and_then(|list| list.task(task_id))
    }

    fn task_mut(&mut self, list_id: &str, task_id: &str) -> Option<&mut Task> {
        self.list_mut(list_id).and_then(|list| list.task_mut(task_id))
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            lists: self.lists.clone(),
            selected: self.selected.clone(),
        }
    }

    /// Writes the collection; restores `before` when the write fails.
    fn persist(&mut self, event: &'static str, before: Snapshot) -> RepoResult<()> {
        match self.repo.save_lists(&self.lists) {
            Ok(()) => {
                info!(
                    "event={event} module=tasks status=ok lists={}",
                    self.lists.len()
                );
                Ok(())
            }
            Err(err) => {
                warn!("event={event} module=tasks status=rolled_back error={err}");
                self.lists = before.lists;
                self.selected = before.selected;
                Err(err)
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
