//! SQLite-backed list store.
//!
//! # Responsibility
//! - Persist tasks and items in the `tasks` / `items` tables.
//! - Apply a staged batch inside one `IMMEDIATE` transaction.
//!
//! # Invariants
//! - Construction requires a fully migrated connection.
//! - Cascading item deletion is enforced by the `items.task_uuid` foreign key.
//! - Listing is deterministic: the requested key, then `uuid ASC`.

use super::{
    EntityKind, ItemQuery, ItemSortKey, ListStore, Mutation, SortDirection, StoreError,
    StoreResult, TaskQuery, TaskSortKey,
};
use crate::db::migrations::latest_version;
use crate::model::item::{Item, ItemId, ItemScope};
use crate::model::task::{Task, TaskId};
use log::{debug, error};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::cell::RefCell;
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    created_at
FROM tasks";

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    task_uuid,
    text,
    sort_order,
    is_favorite,
    created_at
FROM items";

/// List store over a migrated SQLite connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
    staged: RefCell<Vec<Mutation>>,
}

impl<'conn> SqliteStore<'conn> {
    /// Creates a store from a connection returned by `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self {
            conn,
            staged: RefCell::new(Vec::new()),
        })
    }
}

impl ListStore for SqliteStore<'_> {
    fn fetch_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let column = match query.sort_key {
            TaskSortKey::Title => "title",
            TaskSortKey::CreatedAt => "created_at",
        };
        let sql = format!(
            "{TASK_SELECT_SQL} ORDER BY {column} {}, uuid ASC;",
            direction_sql(query.direction)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn fetch_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn fetch_items(&self, query: &ItemQuery) -> StoreResult<Vec<Item>> {
        let column = match query.sort_key {
            ItemSortKey::Order => "sort_order",
            ItemSortKey::Text => "text",
            ItemSortKey::CreatedAt => "created_at",
        };
        let filter = match query.scope {
            ItemScope::Task(_) => "task_uuid = ?1",
            ItemScope::Flat => "task_uuid IS NULL",
        };
        let sql = format!(
            "{ITEM_SELECT_SQL} WHERE {filter} ORDER BY {column} {}, uuid ASC;",
            direction_sql(query.direction)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = match query.scope {
            ItemScope::Task(task_id) => stmt.query([task_id.to_string()])?,
            ItemScope::Flat => stmt.query([])?,
        };
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn fetch_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }
        Ok(None)
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
        match commit_batch(self.conn, &staged) {
            Ok(()) => {
                debug!(
                    "event=store_commit module=store status=ok backend=sqlite mutations={mutations}"
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_commit module=store status=error backend=sqlite mutations={mutations} error={err}"
                );
                Err(err)
            }
        }
    }

    fn discard(&self) {
        self.staged.borrow_mut().clear();
    }
}

fn commit_batch(conn: &Connection, staged: &[Mutation]) -> StoreResult<()> {
    // Dropping `tx` on an early return rolls the whole batch back.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    for mutation in staged {
        apply_mutation(&tx, mutation)?;
    }
    tx.commit()?;
    Ok(())
}

fn apply_mutation(conn: &Connection, mutation: &Mutation) -> StoreResult<()> {
    let (changed, entity, id) = match mutation {
        Mutation::InsertTask(task) => {
            task.validate()
                .map_err(|err| StoreError::InvalidData(err.to_string()))?;
            let changed = conn.execute(
                "INSERT INTO tasks (uuid, title, created_at) VALUES (?1, ?2, ?3);",
                params![task.id.to_string(), task.title.as_str(), task.created_at],
            )?;
            (changed, EntityKind::Task, task.id)
        }
        Mutation::UpdateTask(task) => {
            task.validate()
                .map_err(|err| StoreError::InvalidData(err.to_string()))?;
            let changed = conn.execute(
                "UPDATE tasks SET title = ?2 WHERE uuid = ?1;",
                params![task.id.to_string(), task.title.as_str()],
            )?;
            (changed, EntityKind::Task, task.id)
        }
        Mutation::DeleteTask(id) => {
            let changed = conn.execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;
            (changed, EntityKind::Task, *id)
        }
        Mutation::InsertItem(item) => {
            item.validate()
                .map_err(|err| StoreError::InvalidData(err.to_string()))?;
            let changed = conn.execute(
                "INSERT INTO items (
                    uuid,
                    task_uuid,
                    text,
                    sort_order,
                    is_favorite,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    item.id.to_string(),
                    item.task_id.map(|value| value.to_string()),
                    item.text.as_str(),
                    item.order,
                    bool_to_int(item.is_favorite),
                    item.created_at,
                ],
            )?;
            (changed, EntityKind::Item, item.id)
        }
        Mutation::UpdateItem(item) => {
            item.validate()
                .map_err(|err| StoreError::InvalidData(err.to_string()))?;
            let changed = conn.execute(
                "UPDATE items
                 SET
                    task_uuid = ?2,
                    text = ?3,
                    sort_order = ?4,
                    is_favorite = ?5
                 WHERE uuid = ?1;",
                params![
                    item.id.to_string(),
                    item.task_id.map(|value| value.to_string()),
                    item.text.as_str(),
                    item.order,
                    bool_to_int(item.is_favorite),
                ],
            )?;
            (changed, EntityKind::Item, item.id)
        }
        Mutation::DeleteItem(id) => {
            let changed = conn.execute("DELETE FROM items WHERE uuid = ?1;", [id.to_string()])?;
            (changed, EntityKind::Item, *id)
        }
    };

    if changed == 0 {
        return Err(StoreError::MissingRow { entity, id });
    }
    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "tasks.uuid")?;
    Task::with_id(id, row.get::<_, String>("title")?, row.get("created_at")?)
        .map_err(|err| StoreError::InvalidData(format!("{err} (task {id})")))
}

fn parse_item_row(row: &Row<'_>) -> StoreResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "items.uuid")?;
    let task_id = row
        .get::<_, Option<String>>("task_uuid")?
        .map(|value| parse_uuid(&value, "items.task_uuid"))
        .transpose()?;

    let is_favorite = match row.get::<_, i64>("is_favorite")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_favorite value `{other}` in items.is_favorite"
            )));
        }
    };

    let item = Item {
        id,
        task_id,
        text: row.get("text")?,
        order: row.get("sort_order")?,
        is_favorite,
        created_at: row.get("created_at")?,
    };
    item.validate()
        .map_err(|err| StoreError::InvalidData(format!("{err} (item {id})")))?;
    Ok(item)
}

fn parse_uuid(value: &str, column: &'static str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn direction_sql(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("tasks", &["uuid", "title", "created_at"]),
    (
        "items",
        &[
            "uuid",
            "task_uuid",
            "text",
            "sort_order",
            "is_favorite",
            "created_at",
        ],
    ),
];

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(StoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
