//! Durable store contract and backends.
//!
//! # Responsibility
//! - Define the transactional contract repositories rely on: sorted fetches,
//!   staged mutations, and one atomic commit per batch.
//! - Provide an in-memory backend and a SQLite backend.
//!
//! # Invariants
//! - `commit` applies every staged mutation or none of them.
//! - `commit` always clears the staged batch, whether it succeeds or not.
//! - Deleting a task deletes every item whose `task_id` points at it.
//! - Fetches observe committed state only.

use crate::db::DbError;
use crate::model::item::{Item, ItemId, ItemScope};
use crate::model::task::{Task, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod memory;
pub mod sqlite;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity family addressed by a store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Item,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Item => write!(f, "item"),
        }
    }
}

/// Store-level failure. Repositories surface these as persistence errors.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Update or delete targeted a row that does not exist.
    MissingRow { entity: EntityKind, id: Uuid },
    /// Insert reused an id that is already stored.
    DuplicateId { entity: EntityKind, id: Uuid },
    /// Item references a task that does not exist.
    DanglingTask { item: ItemId, task: TaskId },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Failure injected through `MemoryStore::fail_next_commit`. Only seen
    /// in tests; real backends never produce it.
    Injected(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "list store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "list store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "list store requires column `{column}` in table `{table}`"
            ),
            Self::MissingRow { entity, id } => write!(f, "{entity} not stored: {id}"),
            Self::DuplicateId { entity, id } => write!(f, "{entity} already stored: {id}"),
            Self::DanglingTask { item, task } => {
                write!(f, "item {item} references missing task {task}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted list data: {message}"),
            Self::Injected(reason) => write!(f, "commit failed: {reason}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSortKey {
    #[default]
    Title,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemSortKey {
    #[default]
    Order,
    Text,
    CreatedAt,
}

/// Sorted fetch over all tasks. Ties are broken by id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskQuery {
    pub sort_key: TaskSortKey,
    pub direction: SortDirection,
}

/// Sorted fetch over the items of one scope. Ties are broken by id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemQuery {
    pub scope: ItemScope,
    pub sort_key: ItemSortKey,
    pub direction: SortDirection,
}

impl ItemQuery {
    /// Items of `scope` in display order.
    pub fn by_order(scope: ItemScope) -> Self {
        Self {
            scope,
            sort_key: ItemSortKey::Order,
            direction: SortDirection::Ascending,
        }
    }
}

/// One staged change, applied on the next `commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    InsertTask(Task),
    UpdateTask(Task),
    /// Cascades to the task's items.
    DeleteTask(TaskId),
    InsertItem(Item),
    UpdateItem(Item),
    DeleteItem(ItemId),
}

/// Transactional store contract used by the list repositories.
///
/// Methods take `&self`; backends keep the staged batch behind interior
/// mutability so both repositories can share one session.
pub trait ListStore {
    fn fetch_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;
    fn fetch_task(&self, id: TaskId) -> StoreResult<Option<Task>>;
    fn fetch_items(&self, query: &ItemQuery) -> StoreResult<Vec<Item>>;
    fn fetch_item(&self, id: ItemId) -> StoreResult<Option<Item>>;
    /// Queues a mutation for the next commit.
    fn stage(&self, mutation: Mutation);
    /// Number of mutations waiting for commit.
    fn staged_len(&self) -> usize;
    /// Atomically applies and clears the staged batch.
    fn commit(&self) -> StoreResult<()>;
    /// Drops the staged batch without applying it.
    fn discard(&self);
}

impl<S: ListStore + ?Sized> ListStore for &S {
    fn fetch_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        (**self).fetch_tasks(query)
    }

    fn fetch_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        (**self).fetch_task(id)
    }

    fn fetch_items(&self, query: &ItemQuery) -> StoreResult<Vec<Item>> {
        (**self).fetch_items(query)
    }

    fn fetch_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        (**self).fetch_item(id)
    }

    fn stage(&self, mutation: Mutation) {
        (**self).stage(mutation);
    }

    fn staged_len(&self) -> usize {
        (**self).staged_len()
    }

    fn commit(&self) -> StoreResult<()> {
        (**self).commit()
    }

    fn discard(&self) {
        (**self).discard();
    }
}
