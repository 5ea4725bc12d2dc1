//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tobuy_core` linkage end to end on an in-memory database.
//! - Print the resulting lists as JSON for quick local sanity checks.
//! - Write core log events under `$TMPDIR/tobuy-cli-logs`.

use log::{error, info};
use std::env;
use std::process::ExitCode;
use tobuy_core::db::open_db_in_memory;
use tobuy_core::{
    default_log_level, init_logging, ItemRepository, ItemScope, SqliteStore, TaskRepository,
};

fn main() -> ExitCode {
    println!("tobuy_core version={}", tobuy_core::core_version());

    let log_dir = env::temp_dir().join("tobuy-cli-logs");
    match init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        Ok(()) => println!("logs={}", log_dir.display()),
        Err(err) => eprintln!("logging disabled: {err}"),
    }

    match run() {
        Ok(()) => {
            info!("event=cli_smoke module=cli status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_smoke module=cli status=error error={err}");
            eprintln!("smoke run failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let store = SqliteStore::try_new(&conn)?;
    let tasks = TaskRepository::new(&store);
    let items = ItemRepository::new(&store);

    let groceries = tasks.add_task_titled("Groceries")?;
    let scope = ItemScope::Task(groceries.id);
    for text in ["Milk", "Eggs", "milk"] {
        items.add_item(scope, text)?;
    }
    if let Err(err) = items.add_item(scope, "Milk") {
        println!("duplicate rejected: {err}");
    }
    items.move_item(scope, 0, 2)?;

    println!("{}", serde_json::to_string_pretty(&tasks.list_tasks()?)?);
    println!("{}", serde_json::to_string_pretty(&items.list_items(scope)?)?);
    Ok(())
}
