//! In-memory list store.
//!
//! # Responsibility
//! - Back repositories in tests and ephemeral sessions without SQLite.
//! - Mirror the SQLite backend's ordering, cascade and failure behavior.
//!
//! # Invariants
//! - Commit applies the batch to a scratch copy and swaps it in only when
//!   every mutation succeeded.
//! - Items never reference a task that is not stored.

use super::{
    EntityKind, ItemQuery, ItemSortKey, ListStore, Mutation, SortDirection, StoreError,
    StoreResult, TaskQuery, TaskSortKey,
};
use crate::model::item::{Item, ItemId};
use crate::model::task::{Task, TaskId};
use log::{debug, error};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    tasks: BTreeMap<TaskId, Task>,
    items: BTreeMap<ItemId, Item>,
}

impl MemoryState {
    fn apply(&mut self, mutation: Mutation) -> StoreResult<()> {
        match mutation {
            Mutation::InsertTask(task) => {
                if self.tasks.contains_key(&task.id) {
                    return Err(StoreError::DuplicateId {
                        entity: EntityKind::Task,
                        id: task.id,
                    });
                }
                self.tasks.insert(task.id, task);
            }
            Mutation::UpdateTask(task) => match self.tasks.get_mut(&task.id) {
                Some(slot) => *slot = task,
                None => {
                    return Err(StoreError::MissingRow {
                        entity: EntityKind::Task,
                        id: task.id,
                    })
                }
            },
            Mutation::DeleteTask(id) => {
                if self.tasks.remove(&id).is_none() {
                    return Err(StoreError::MissingRow {
                        entity: EntityKind::Task,
                        id,
                    });
                }
                self.items.retain(|_, item| item.task_id != Some(id));
            }
            Mutation::InsertItem(item) => {
                if self.items.contains_key(&item.id) {
                    return Err(StoreError::DuplicateId {
                        entity: EntityKind::Item,
                        id: item.id,
                    });
                }
                self.ensure_task_exists(&item)?;
                self.items.insert(item.id, item);
            }
            Mutation::UpdateItem(item) => {
                if !self.items.contains_key(&item.id) {
                    return Err(StoreError::MissingRow {
                        entity: EntityKind::Item,
                        id: item.id,
                    });
                }
                self.ensure_task_exists(&item)?;
                self.items.insert(item.id, item);
            }
            Mutation::DeleteItem(id) => {
                if self.items.remove(&id).is_none() {
                    return Err(StoreError::MissingRow {
                        entity: EntityKind::Item,
                        id,
                    });
                }
            }
        }
        Ok(())
    }

    fn ensure_task_exists(&self, item: &Item) -> StoreResult<()> {
        match item.task_id {
            Some(task) if !self.tasks.contains_key(&task) => Err(StoreError::DanglingTask {
                item: item.id,
                task,
            }),
            _ => Ok(()),
        }
    }
}

/// `BTreeMap`-backed store holding one session's committed state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemoryState>,
    staged: RefCell<Vec<Mutation>>,
    injected_failure: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit carrying at least one mutation fail with
    /// `StoreError::Injected`, leaving committed state untouched.
    ///
    /// # Test support
    /// Exists so callers can exercise their `RepoError::Persistence`
    /// paths. Production sessions never call it; `SqliteStore` has no
    /// equivalent.
    pub fn fail_next_commit(&self, reason: impl Into<String>) {
        *self.injected_failure.borrow_mut() = Some(reason.into());
    }
}

impl ListStore for MemoryStore {
    fn fetch_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self.state.borrow().tasks.values().cloned().collect();
        tasks.sort_by(|left, right| compare_tasks(left, right, query));
        Ok(tasks)
    }

    fn fetch_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        Ok(self.state.borrow().tasks.get(&id).cloned())
    }

    fn fetch_items(&self, query: &ItemQuery) -> StoreResult<Vec<Item>> {
        let task_id = query.scope.task_id();
        let mut items: Vec<Item> = self
            .state
            .borrow()
            .items
            .values()
            .filter(|item| item.task_id == task_id)
            .cloned()
            .collect();
        items.sort_by(|left, right| compare_items(left, right, query));
        Ok(items)
    }

    fn fetch_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.state.borrow().items.get(&id).cloned())
    }

    fn stage(&self, mutation: Mutation) {
        self.staged.borrow_mut().push(mutation);
    }

    fn staged_len(&self) -> usize {
        self.staged.borrow().len()
    }

    fn commit(&self) -> StoreResult<()> {
        let staged = self.staged.take();
        if staged.is_empty() {
            return Ok(());
        }

        let mutations = staged.len();
        if let Some(reason) = self.injected_failure.take() {
            error!(
                "event=store_commit module=store status=error backend=memory mutations={mutations} error_code=injected"
            );
            return Err(StoreError::Injected(reason));
        }

        let mut next = self.state.borrow().clone();
        for mutation in staged {
            if let Err(err) = next.apply(mutation) {
                error!(
                    "event=store_commit module=store status=error backend=memory mutations={mutations} error={err}"
                );
                return Err(err);
            }
        }
        *self.state.borrow_mut() = next;

        debug!("event=store_commit module=store status=ok backend=memory mutations={mutations}");
        Ok(())
    }

    fn discard(&self) {
        self.staged.borrow_mut().clear();
    }
}

fn compare_tasks(left: &Task, right: &Task, query: &TaskQuery) -> Ordering {
    let primary = match query.sort_key {
        TaskSortKey::Title => left.title.cmp(&right.title),
        TaskSortKey::CreatedAt => left.created_at.cmp(&right.created_at),
    };
    directed(primary, query.direction).then_with(|| left.id.cmp(&right.id))
}

fn compare_items(left: &Item, right: &Item, query: &ItemQuery) -> Ordering {
    let primary = match query.sort_key {
        ItemSortKey::Order => left.order.cmp(&right.order),
        ItemSortKey::Text => left.text.cmp(&right.text),
        ItemSortKey::CreatedAt => left.created_at.cmp(&right.created_at),
    };
    directed(primary, query.direction).then_with(|| left.id.cmp(&right.id))
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}
