//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register depot schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//! - Confirm every entity table exists once the schema is current.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Every uniqueness-key column carries a `UNIQUE` constraint.
//! - A database reporting the latest version still fails to open when any
//!   `EntityKind` table is absent (for example dropped by hand).

use crate::db::{DbError, DbResult};
use crate::model::EntityKind;
use log::debug;
use rusqlite::{params, Connection};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_registry.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_orders.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version < latest {
        let tx = conn.transaction()?;
        for migration in MIGRATIONS
            .iter()
            .filter(|migration| migration.version > current_version)
        {
            tx.execute_batch(migration.sql)?;
            tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        }
        tx.commit()?;
        debug!(
            "event=db_migrate module=db status=ok from_version={current_version} to_version={latest}"
        );
    }

    verify_entity_tables(conn, latest)
}

/// Lists the `EntityKind` tables absent from the connection.
pub fn missing_entity_tables(conn: &Connection) -> DbResult<Vec<&'static str>> {
    let mut stmt =
        conn.prepare("SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);")?;
    let mut missing = Vec::new();
    for kind in EntityKind::ALL {
        let exists: bool = stmt.query_row(params![kind.table()], |row| row.get(0))?;
        if !exists {
            missing.push(kind.table());
        }
    }
    Ok(missing)
}

fn verify_entity_tables(conn: &Connection, version: u32) -> DbResult<()> {
    let missing = missing_entity_tables(conn)?;
    if missing.is_empty() {
        return Ok(());
    }
    Err(DbError::IncompleteSchema { version, missing })
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
