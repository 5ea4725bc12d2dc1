//! Task list repository.
//!
//! # Responsibility
//! - Create, rename, delete and look up task lists.
//! - Provide the in-memory task reordering affordance.
//!
//! # Invariants
//! - `list_tasks` is ordered by title, then id.
//! - Task deletion removes the task's items in the same commit (store cascade).
//! - Task order is not persisted; `move_task` only rearranges a caller view.

use super::{commit_staged, normalize_text, relocate, relocate_before, RepoError, RepoResult};
use crate::model::task::{Task, TaskId};
use crate::store::{ListStore, Mutation, TaskQuery};
use log::info;

/// Repository over the task lists of one store session.
pub struct TaskRepository<S: ListStore> {
    store: S,
}

impl<S: ListStore> TaskRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All tasks sorted by title ascending.
    pub fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        Ok(self.store.fetch_tasks(&TaskQuery::default())?)
    }

    pub fn count_tasks(&self) -> RepoResult<usize> {
        Ok(self.list_tasks()?.len())
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        Ok(self.store.fetch_task(id)?)
    }

    /// Creates a task titled `Task {n+1}`, where `n` is the current count.
    pub fn add_task(&self) -> RepoResult<Task> {
        let title = Task::default_title(self.count_tasks()?);
        self.insert(Task::new(title))
    }

    /// Creates a task with a caller-chosen title (trimmed, non-blank).
    pub fn add_task_titled(&self, title: &str) -> RepoResult<Task> {
        let title = normalize_text(title)?;
        self.insert(Task::new(title))
    }

    pub fn rename_task(&self, id: TaskId, title: &str) -> RepoResult<Task> {
        let title = normalize_text(title)?;
        let mut task = self.require_task(id)?;
        if task.title == title {
            return Ok(task);
        }

        task.title = title.to_string();
        self.store.stage(Mutation::UpdateTask(task.clone()));
        commit_staged(&self.store, "task_rename")?;

        info!("event=task_rename module=repo status=ok task={id}");
        Ok(task)
    }

    /// Deletes a task together with all of its items.
    pub fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        self.require_task(id)?;
        self.store.stage(Mutation::DeleteTask(id));
        commit_staged(&self.store, "task_delete")?;

        info!("event=task_delete module=repo status=ok task={id}");
        Ok(())
    }

    fn insert(&self, task: Task) -> RepoResult<Task> {
        self.store.stage(Mutation::InsertTask(task.clone()));
        commit_staged(&self.store, "task_add")?;

        info!("event=task_add module=repo status=ok task={}", task.id);
        Ok(task)
    }

    fn require_task(&self, id: TaskId) -> RepoResult<Task> {
        self.store
            .fetch_task(id)?
            .ok_or(RepoError::TaskNotFound(id))
    }
}

/// Moves a task inside a caller-held view so that it ends up at index `to`.
///
/// Nothing is persisted: the next `list_tasks` is ordered by title again.
pub fn move_task(view: &mut Vec<Task>, from: usize, to: usize) -> RepoResult<()> {
    relocate(view, from, to)
}

/// Like `move_task`, with `destination` naming the gap in the view before the
/// move (list drag-and-drop semantics).
pub fn move_task_before(view: &mut Vec<Task>, from: usize, destination: usize) -> RepoResult<()> {
    relocate_before(view, from, destination)
}
