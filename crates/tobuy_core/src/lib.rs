//! Core list logic for ToBuy.
//! Tasks own ordered items; repositories keep that order dense and durable.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Item, ItemId, ItemScope, ItemValidationError};
pub use model::task::{Task, TaskId, TaskValidationError};
pub use repo::item_repo::ItemRepository;
pub use repo::task_repo::{move_task, move_task_before, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use store::memory::MemoryStore;
pub use store::sqlite::SqliteStore;
pub use store::{
    ItemQuery, ItemSortKey, ListStore, Mutation, SortDirection, StoreError, StoreResult,
    TaskQuery, TaskSortKey,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
