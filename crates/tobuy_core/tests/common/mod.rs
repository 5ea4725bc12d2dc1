#![allow(dead_code)]

use tobuy_core::db::open_db_in_memory;
use tobuy_core::{Item, ListStore, MemoryStore, SqliteStore};

/// Runs `check` once against each store backend.
pub fn for_each_store(check: impl Fn(&dyn ListStore)) {
    let memory = MemoryStore::new();
    check(&memory);

    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteStore::try_new(&conn).unwrap();
    check(&sqlite);
}

pub fn texts(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.text.as_str()).collect()
}

pub fn orders(items: &[Item]) -> Vec<i64> {
    items.iter().map(|item| item.order).collect()
}

pub fn assert_dense(items: &[Item]) {
    let expected: Vec<i64> = (0..items.len() as i64).collect();
    assert_eq!(orders(items), expected, "orders are not dense: {items:?}");
}
