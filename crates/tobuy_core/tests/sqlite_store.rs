use rusqlite::Connection;
use tobuy_core::db::migrations::latest_version;
use tobuy_core::db::{open_db, open_db_in_memory};
use tobuy_core::{
    ItemQuery, ItemRepository, ItemScope, ItemSortKey, ListStore, Mutation, SortDirection,
    SqliteStore, StoreError, Task, TaskQuery, TaskRepository, TaskSortKey,
};

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteStore::try_new(&conn) {
        Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_without_items_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE tasks (uuid TEXT PRIMARY KEY, title TEXT, created_at INTEGER);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();

    assert!(matches!(
        SqliteStore::try_new(&conn),
        Err(StoreError::MissingRequiredTable("items"))
    ));
}

#[test]
fn store_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE tasks (uuid TEXT PRIMARY KEY, title TEXT, created_at INTEGER);
         CREATE TABLE items (
            uuid TEXT PRIMARY KEY,
            task_uuid TEXT,
            text TEXT,
            sort_order INTEGER,
            created_at INTEGER
         );
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();

    assert!(matches!(
        SqliteStore::try_new(&conn),
        Err(StoreError::MissingRequiredColumn {
            table: "items",
            column: "is_favorite"
        })
    ));
}

#[test]
fn failing_write_rolls_back_whole_batch() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let tasks = TaskRepository::new(&store);
    let items = ItemRepository::new(&store);
    let task = tasks.add_task_titled("Groceries").unwrap();
    let scope = ItemScope::Task(task.id);
    for text in ["A", "B", "C"] {
        items.add_item(scope, text).unwrap();
    }

    conn.execute_batch(
        "CREATE TRIGGER refuse_reorder BEFORE UPDATE OF sort_order ON items
         WHEN NEW.sort_order = 0
         BEGIN
            SELECT RAISE(ABORT, 'disk full');
         END;",
    )
    .unwrap();

    let err = items.move_item(scope, 2, 0).unwrap_err();
    assert!(err.is_persistence());
    assert_eq!(store.staged_len(), 0);

    let listed = items.list_items(scope).unwrap();
    let texts: Vec<_> = listed.iter().map(|item| item.text.as_str()).collect();
    let orders: Vec<_> = listed.iter().map(|item| item.order).collect();
    assert_eq!(texts, vec!["A", "B", "C"]);
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn missing_row_fails_commit() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    store.stage(Mutation::UpdateTask(Task::new("ghost")));
    assert!(matches!(
        store.commit(),
        Err(StoreError::MissingRow { .. })
    ));
}

#[test]
fn task_delete_cascades_at_table_level() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let tasks = TaskRepository::new(&store);
    let items = ItemRepository::new(&store);
    let task = tasks.add_task().unwrap();
    items.add_item(ItemScope::Task(task.id), "Milk").unwrap();
    items.add_item(ItemScope::Task(task.id), "Eggs").unwrap();

    tasks.delete_task(task.id).unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn sorted_fetches_honor_key_and_direction() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let tasks = TaskRepository::new(&store);
    let items = ItemRepository::new(&store);
    tasks.add_task_titled("Alpha").unwrap();
    let task = tasks.add_task_titled("Beta").unwrap();
    for text in ["pears", "apples", "figs"] {
        items.add_item(ItemScope::Task(task.id), text).unwrap();
    }

    let descending = store
        .fetch_tasks(&TaskQuery {
            sort_key: TaskSortKey::Title,
            direction: SortDirection::Descending,
        })
        .unwrap();
    assert_eq!(descending[0].title, "Beta");

    let by_text = store
        .fetch_items(&ItemQuery {
            scope: ItemScope::Task(task.id),
            sort_key: ItemSortKey::Text,
            direction: SortDirection::Ascending,
        })
        .unwrap();
    let texts: Vec<_> = by_text.iter().map(|item| item.text.as_str()).collect();
    assert_eq!(texts, vec!["apples", "figs", "pears"]);
}

#[test]
fn lists_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tobuy.db");

    let task_id = {
        let conn = open_db(&path).unwrap();
        let store = SqliteStore::try_new(&conn).unwrap();
        let task = TaskRepository::new(&store).add_task().unwrap();
        let items = ItemRepository::new(&store);
        items.add_item(ItemScope::Task(task.id), "Milk").unwrap();
        let eggs = items
            .add_item(ItemScope::Task(task.id), "Eggs")
            .unwrap()
            .unwrap();
        items.toggle_favorite(eggs.id).unwrap();
        task.id
    };

    let conn = open_db(&path).unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();
    let listed = ItemRepository::new(&store)
        .list_items(ItemScope::Task(task_id))
        .unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].text, "Eggs");
    assert!(listed[1].is_favorite);
    assert!(!listed[0].is_favorite);
}
