//! Item repository: ordered entries of one scope.
//!
//! # Responsibility
//! - Add items with duplicate detection and append ordering.
//! - Delete, reorder, rename and favorite items.
//!
//! # Invariants
//! - Text is compared after trimming, exactly and case-sensitively.
//! - New items get `order = max + 1` (`0` in an empty scope).
//! - Delete and move renumber the scope to `0..n` in the same commit.
//! - Only rows whose order actually changed are staged.

use super::{commit_staged, normalize_text, relocate, relocate_before, RepoError, RepoResult};
use crate::model::item::{Item, ItemId, ItemScope};
use crate::store::{ItemQuery, ListStore, Mutation};
use log::{debug, info};
use std::collections::BTreeSet;

/// Repository over the items of one store session.
pub struct ItemRepository<S: ListStore> {
    store: S,
}

impl<S: ListStore> ItemRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Items of `scope` sorted by order ascending.
    ///
    /// A task that does not exist (or was deleted) yields an empty list.
    pub fn list_items(&self, scope: ItemScope) -> RepoResult<Vec<Item>> {
        Ok(self.store.fetch_items(&ItemQuery::by_order(scope))?)
    }

    pub fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        Ok(self.store.fetch_item(id)?)
    }

    /// Appends an item to `scope`.
    ///
    /// Returns `Ok(None)` without touching the store when `text` is blank,
    /// and `RepoError::DuplicateItem` when a sibling already has the same
    /// trimmed text.
    pub fn add_item(&self, scope: ItemScope, text: &str) -> RepoResult<Option<Item>> {
        self.ensure_scope_exists(scope)?;
        let trimmed = text.trim();
        let siblings = self.list_items(scope)?;

        if siblings.iter().any(|item| item.text == trimmed) {
            info!(
                "event=item_add module=repo status=rejected reason=duplicate siblings={}",
                siblings.len()
            );
            return Err(RepoError::DuplicateItem {
                scope,
                text: trimmed.to_string(),
            });
        }
        if trimmed.is_empty() {
            debug!("event=item_add module=repo status=skipped reason=empty_text");
            return Ok(None);
        }

        let order = siblings
            .iter()
            .map(|item| item.order)
            .max()
            .map_or(0, |max| max + 1);
        let item = Item::new(scope, trimmed, order);
        self.store.stage(Mutation::InsertItem(item.clone()));
        commit_staged(&self.store, "item_add")?;

        info!(
            "event=item_add module=repo status=ok item={} order={order}",
            item.id
        );
        Ok(Some(item))
    }

    /// Deletes the items at `indices` of the current sorted view and
    /// renumbers the survivors. Repeated indices are ignored.
    ///
    /// Returns the deleted items in view order.
    pub fn delete_items(&self, scope: ItemScope, indices: &[usize]) -> RepoResult<Vec<Item>> {
        let items = self.list_items(scope)?;
        let targets: BTreeSet<usize> = indices.iter().copied().collect();
        if let Some(&index) = targets.iter().find(|&&index| index >= items.len()) {
            return Err(RepoError::IndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let mut removed = Vec::with_capacity(targets.len());
        let mut survivors = Vec::with_capacity(items.len() - targets.len());
        for (index, item) in items.into_iter().enumerate() {
            if targets.contains(&index) {
                self.store.stage(Mutation::DeleteItem(item.id));
                removed.push(item);
            } else {
                survivors.push(item);
            }
        }

        self.stage_renumbered(&mut survivors);
        commit_staged(&self.store, "item_delete")?;

        info!(
            "event=item_delete module=repo status=ok deleted={} remaining={}",
            removed.len(),
            survivors.len()
        );
        Ok(removed)
    }

    /// Moves the item at `from` so that it ends up at index `to` and
    /// renumbers the scope. `to` may equal the item count, meaning "last".
    ///
    /// Returns the scope in its new order.
    pub fn move_item(&self, scope: ItemScope, from: usize, to: usize) -> RepoResult<Vec<Item>> {
        let mut items = self.list_items(scope)?;
        relocate(&mut items, from, to)?;
        self.commit_reordered(items, from, to)
    }

    /// Moves the item at `from` into the gap before `destination`, where
    /// `destination` indexes the view before the move (list drag-and-drop
    /// semantics: a forward move lands at `destination - 1`).
    pub fn move_item_before(
        &self,
        scope: ItemScope,
        from: usize,
        destination: usize,
    ) -> RepoResult<Vec<Item>> {
        let mut items = self.list_items(scope)?;
        relocate_before(&mut items, from, destination)?;
        self.commit_reordered(items, from, destination)
    }

    /// Flips the favorite flag and returns the updated item.
    pub fn toggle_favorite(&self, id: ItemId) -> RepoResult<Item> {
        let mut item = self.require_item(id)?;
        item.toggle_favorite();
        self.store.stage(Mutation::UpdateItem(item.clone()));
        commit_staged(&self.store, "item_favorite")?;

        debug!(
            "event=item_favorite module=repo status=ok item={id} is_favorite={}",
            item.is_favorite
        );
        Ok(item)
    }

    /// Replaces an item's text, keeping its position.
    ///
    /// The new text is trimmed, must not be blank, and must not collide with
    /// another sibling's text.
    pub fn rename_item(&self, id: ItemId, text: &str) -> RepoResult<Item> {
        let text = normalize_text(text)?;
        let mut item = self.require_item(id)?;
        if item.text == text {
            return Ok(item);
        }

        let scope = item.scope();
        let siblings = self.list_items(scope)?;
        if siblings
            .iter()
            .any(|sibling| sibling.id != id && sibling.text == text)
        {
            return Err(RepoError::DuplicateItem {
                scope,
                text: text.to_string(),
            });
        }

        item.text = text.to_string();
        self.store.stage(Mutation::UpdateItem(item.clone()));
        commit_staged(&self.store, "item_rename")?;

        debug!("event=item_rename module=repo status=ok item={id}");
        Ok(item)
    }

    fn commit_reordered(
        &self,
        mut items: Vec<Item>,
        from: usize,
        to: usize,
    ) -> RepoResult<Vec<Item>> {
        self.stage_renumbered(&mut items);
        let changed = self.store.staged_len();
        commit_staged(&self.store, "item_move")?;

        debug!("event=item_move module=repo status=ok from={from} to={to} changed={changed}");
        Ok(items)
    }

    /// Rewrites `order` to each element's position, walking from the end,
    /// and stages an update for every element that changed.
    fn stage_renumbered(&self, items: &mut [Item]) {
        for index in (0..items.len()).rev() {
            let position = index as i64;
            let item = &mut items[index];
            if item.order != position {
                item.order = position;
                self.store.stage(Mutation::UpdateItem(item.clone()));
            }
        }
    }

    fn ensure_scope_exists(&self, scope: ItemScope) -> RepoResult<()> {
        if let ItemScope::Task(task_id) = scope {
            if self.store.fetch_task(task_id)?.is_none() {
                return Err(RepoError::TaskNotFound(task_id));
            }
        }
        Ok(())
    }

    fn require_item(&self, id: ItemId) -> RepoResult<Item> {
        self.store
            .fetch_item(id)?
            .ok_or(RepoError::ItemNotFound(id))
    }
}
