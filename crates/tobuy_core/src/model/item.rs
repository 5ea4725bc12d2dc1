//! Item (list entry) record and sibling scope.
//!
//! # Responsibility
//! - Define the list entry shape persisted by stores.
//! - Define `ItemScope`, the sibling set an item is ordered within.
//!
//! # Invariants
//! - `text` is stored trimmed and is never empty.
//! - `order` is non-negative; repositories keep it dense (`0..n`) per scope.
//! - Deserialization validates records and rejects invalid input.

use super::now_epoch_ms;
use super::task::TaskId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a list item.
pub type ItemId = Uuid;

/// Sibling set used for ordering and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemScope {
    /// Items owned by one task.
    Task(TaskId),
    /// Task-agnostic single list (items with no owning task).
    Flat,
}

impl ItemScope {
    pub fn task_id(self) -> Option<TaskId> {
        match self {
            Self::Task(id) => Some(id),
            Self::Flat => None,
        }
    }
}

impl From<Option<TaskId>> for ItemScope {
    fn from(value: Option<TaskId>) -> Self {
        value.map_or(Self::Flat, Self::Task)
    }
}

/// Single list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord")]
pub struct Item {
    pub id: ItemId,
    /// Owning task. `None` only for flat-list items.
    pub task_id: Option<TaskId>,
    pub text: String,
    /// Position among siblings of the same scope.
    pub order: i64,
    pub is_favorite: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Unvalidated wire shape used as the deserialization source for `Item`.
#[derive(Deserialize)]
struct ItemRecord {
    id: ItemId,
    task_id: Option<TaskId>,
    text: String,
    order: i64,
    #[serde(default)]
    is_favorite: bool,
    created_at: i64,
}

impl TryFrom<ItemRecord> for Item {
    type Error = ItemValidationError;

    fn try_from(value: ItemRecord) -> Result<Self, Self::Error> {
        let item = Self {
            id: value.id,
            task_id: value.task_id,
            text: value.text,
            order: value.order,
            is_favorite: value.is_favorite,
            created_at: value.created_at,
        };
        item.validate()?;
        Ok(item)
    }
}

/// Validation failures for item records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NilId,
    EmptyText,
    UntrimmedText,
    NegativeOrder(i64),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "item id must not be nil"),
            Self::EmptyText => write!(f, "item text must not be empty"),
            Self::UntrimmedText => {
                write!(f, "item text must not have leading or trailing whitespace")
            }
            Self::NegativeOrder(order) => write!(f, "item order must be >= 0, got {order}"),
        }
    }
}

impl Error for ItemValidationError {}

impl Item {
    /// Creates a non-favorite item in `scope` with a generated id.
    ///
    /// Callers are expected to pass already trimmed text.
    pub fn new(scope: ItemScope, text: impl Into<String>, order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: scope.task_id(),
            text: text.into(),
            order,
            is_favorite: false,
            created_at: now_epoch_ms(),
        }
    }

    pub fn scope(&self) -> ItemScope {
        self.task_id.into()
    }

    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
    }

    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_nil() {
            return Err(ItemValidationError::NilId);
        }
        if self.text.is_empty() {
            return Err(ItemValidationError::EmptyText);
        }
        if self.text.trim().len() != self.text.len() {
            return Err(ItemValidationError::UntrimmedText);
        }
        if self.order < 0 {
            return Err(ItemValidationError::NegativeOrder(self.order));
        }
        Ok(())
    }
}
