//! Versioned schema upgrades for the list database.
//!
//! # Invariants
//! - `MIGRATIONS` versions start at 1 and increase by exactly one.
//! - Pending steps run in one transaction; `PRAGMA user_version` is bumped
//!   after each step so a failure reports the step that broke.

use crate::db::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::Connection;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Returns the latest schema version this build can create.
pub fn latest_version() -> u32 {
    newest(MIGRATIONS)
}

/// Brings `conn` up to `latest_version()`.
///
/// Refuses databases written by a newer build instead of guessing at their
/// layout.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    run_migrations(conn, MIGRATIONS)
}

fn newest(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

fn run_migrations(conn: &mut Connection, migrations: &[Migration]) -> DbResult<()> {
    let from_version = user_version(conn)?;
    let to_version = newest(migrations);

    if from_version > to_version {
        error!(
            "event=db_migrate module=db status=error from_version={from_version} to_version={to_version} error_code=schema_too_new"
        );
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: to_version,
        });
    }
    if from_version == to_version {
        debug!("event=db_migrate module=db status=skipped version={from_version}");
        return Ok(());
    }

    let started_at = Instant::now();
    info!("event=db_migrate module=db status=start from_version={from_version} to_version={to_version}");

    let tx = conn.transaction()?;
    for migration in migrations.iter().filter(|m| m.version > from_version) {
        let step = tx
            .execute_batch(migration.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", migration.version));
        if let Err(source) = step {
            error!(
                "event=db_migrate module=db status=error version={} duration_ms={} error_code=migration_failed error={source}",
                migration.version,
                started_at.elapsed().as_millis()
            );
            return Err(DbError::Migration {
                version: migration.version,
                source,
            });
        }
        debug!("event=db_migrate module=db status=step_ok version={}", migration.version);
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from_version} to_version={to_version} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(())
}

fn user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::{run_migrations, user_version, Migration};
    use crate::db::DbError;
    use rusqlite::Connection;

    const BROKEN: &[Migration] = &[
        Migration {
            version: 1,
            sql: "CREATE TABLE tasks (uuid TEXT PRIMARY KEY);",
        },
        Migration {
            version: 2,
            sql: "CREATE TABLE items (uuid TEXT PRIMARY KEY, task_uuid REFERENCES);",
        },
    ];

    #[test]
    fn failing_step_reports_its_version_and_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();

        let err = run_migrations(&mut conn, BROKEN).unwrap_err();
        assert!(matches!(err, DbError::Migration { version: 2, .. }));

        assert_eq!(user_version(&conn).unwrap(), 0);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'tasks';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn up_to_date_database_is_left_alone() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn, &BROKEN[..1]).unwrap();
        assert_eq!(user_version(&conn).unwrap(), 1);

        run_migrations(&mut conn, &BROKEN[..1]).unwrap();
        assert_eq!(user_version(&conn).unwrap(), 1);
    }
}
