//! List repositories.
//!
//! # Responsibility
//! - Enforce list rules (trimming, duplicate detection, dense ordering) above
//!   the store contract.
//! - Turn store commit failures into recoverable `RepoError::Persistence`.
//!
//! # Invariants
//! - Every mutating call validates before staging and commits exactly once.
//! - Nothing is staged when validation fails.
//! - After any completed mutation, item orders in the touched scope are
//!   exactly `0..n`.

use crate::model::item::{ItemId, ItemScope};
use crate::model::task::TaskId;
use crate::store::{ListStore, StoreError};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod item_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from list repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Trimmed text equals an existing sibling's text. Nothing was created.
    DuplicateItem { scope: ItemScope, text: String },
    /// Store commit (or read) failed; the operation was abandoned.
    Persistence(StoreError),
    TaskNotFound(TaskId),
    ItemNotFound(ItemId),
    /// A position does not address the current sorted view.
    IndexOutOfRange { index: usize, len: usize },
    /// Title or text is blank after trimming.
    BlankText,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateItem { text, .. } => write!(f, "item already exists: `{text}`"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} entries")
            }
            Self::BlankText => write!(f, "text must not be blank"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Persistence(value)
    }
}

impl RepoError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateItem { .. })
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Commits the staged batch, logging failures under `event`.
pub(crate) fn commit_staged<S: ListStore>(store: &S, event: &'static str) -> RepoResult<()> {
    store.commit().map_err(|err| {
        error!("event={event} module=repo status=error error_code=commit_failed error={err}");
        RepoError::Persistence(err)
    })
}

/// Moves the element at `from` so that it ends up at index `to`.
///
/// `to == len` is accepted and means "last".
pub(crate) fn relocate<T>(values: &mut Vec<T>, from: usize, to: usize) -> RepoResult<()> {
    let len = values.len();
    if from >= len {
        return Err(RepoError::IndexOutOfRange { index: from, len });
    }
    if to > len {
        return Err(RepoError::IndexOutOfRange { index: to, len });
    }

    let moving = values.remove(from);
    let target = to.min(values.len());
    values.insert(target, moving);
    Ok(())
}

/// Moves the element at `from` into the gap before `destination`, where
/// `destination` indexes the sequence as it was before the removal.
pub(crate) fn relocate_before<T>(
    values: &mut Vec<T>,
    from: usize,
    destination: usize,
) -> RepoResult<()> {
    let len = values.len();
    if from >= len {
        return Err(RepoError::IndexOutOfRange { index: from, len });
    }
    if destination > len {
        return Err(RepoError::IndexOutOfRange {
            index: destination,
            len,
        });
    }

    let target = if destination > from {
        destination - 1
    } else {
        destination
    };
    relocate(values, from, target)
}

/// Trims `value`, rejecting blank input.
pub(crate) fn normalize_text(value: &str) -> RepoResult<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepoError::BlankText);
    }
    Ok(trimmed)
}
