//! List domain model.
//!
//! # Responsibility
//! - Define the plain value records shared by repositories and stores.
//! - Keep records free of live object links; ownership is expressed by id.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - An item belongs to at most one task; `None` means the flat list.

pub mod item;
pub mod task;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
