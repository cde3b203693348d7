//! SQLite bootstrap and schema migration entry points for the row store.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by `storage::row`.
//! - Apply the depot schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Row stores must not touch entity tables before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Connection bootstrap and schema errors.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Schema version is current but entity tables are missing.
    IncompleteSchema {
        version: u32,
        missing: Vec<&'static str>,
    },
    /// Connection is shared and a previous holder panicked while using it.
    Poisoned,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::IncompleteSchema { version, missing } => write!(
                f,
                "database at schema version {version} lacks tables: {}",
                missing.join(", ")
            ),
            Self::Poisoned => write!(f, "shared sqlite connection is poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::IncompleteSchema { .. } => None,
            Self::Poisoned => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
