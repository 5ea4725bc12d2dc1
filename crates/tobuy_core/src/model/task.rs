//! Task (named list) record.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is stored trimmed and is never blank.
//! - Items are not embedded; fetch them by `ItemScope::Task(id)`.

use super::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a task list.
pub type TaskId = Uuid;

/// Named list owning an ordered collection of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    /// Display title. Not required to be unique.
    pub title: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

#[derive(Deserialize)]
struct TaskRecord {
    id: TaskId,
    title: String,
    created_at: i64,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(value: TaskRecord) -> Result<Self, Self::Error> {
        Self::with_id(value.id, value.title, value.created_at)
    }
}

/// Validation failures for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    BlankTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::BlankTitle => write!(f, "task title must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Creates a task with a generated id and the current timestamp.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: now_epoch_ms(),
        }
    }

    /// Creates a task with a caller-provided id, validating the result.
    pub fn with_id(
        id: TaskId,
        title: impl Into<String>,
        created_at: i64,
    ) -> Result<Self, TaskValidationError> {
        let task = Self {
            id,
            title: title.into(),
            created_at,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        Ok(())
    }

    /// Title given to a freshly added task when `existing` tasks already exist.
    pub fn default_title(existing: usize) -> String {
        format!("Task {}", existing + 1)
    }
}
