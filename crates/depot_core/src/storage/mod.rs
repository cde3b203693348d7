//! Storage backends persisting whole entity collections.
//!
//! # Responsibility
//! - Define the backend contract used by `repo::EntityRepository`.
//! - Provide snapshot (JSON file), row (SQLite), and memory implementations.
//!
//! # Invariants
//! - `read_all` on a medium that was never written returns an empty collection.
//! - `write_all` receives the full post-change collection plus the change
//!   itself; snapshot-style backends persist the former, row-style backends
//!   apply the latter.
//! - Backends never check uniqueness or references themselves, except the
//!   row store's `UNIQUE` constraints which surface as `UniqueViolation`.

use crate::db::DbError;
use crate::model::{Entity, EntityId, EntityKind};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod memory;
pub mod row;
pub mod snapshot;

pub use memory::MemoryStore;
pub use row::{share_connection, RowStore, SharedConnection};
pub use snapshot::SnapshotStore;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failures of the persistence medium.
#[derive(Debug)]
pub enum StorageError {
    /// Snapshot file cannot be read or written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Snapshot file content is not a valid collection.
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    Db(DbError),
    /// Row store connection is not at the expected schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Storage-level uniqueness constraint rejected a write.
    UniqueViolation { kind: EntityKind, detail: String },
    /// Row targeted by an update/delete does not exist.
    MissingRow { kind: EntityKind, id: EntityId },
    /// Persisted or in-flight data cannot be mapped to an entity.
    InvalidData(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o failure on `{}`: {source}", path.display()),
            Self::Corrupt { path, source } => {
                write!(f, "corrupt snapshot `{}`: {source}", path.display())
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "row store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "row store requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "row store requires column `{column}` in table `{table}`"
            ),
            Self::UniqueViolation { kind, detail } => {
                write!(f, "unique constraint rejected {kind} write: {detail}")
            }
            Self::MissingRow { kind, id } => write!(f, "{kind} row {id} does not exist"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// How new records obtain their id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdAssignment {
    /// Repository assigns `max(existing) + 1` before writing.
    Sequential,
    /// Backend generates the id while inserting.
    Generated,
}

/// Single mutation carried alongside the full post-change collection.
#[derive(Debug, Clone, Copy)]
pub enum Change<'a, T> {
    Insert(&'a T),
    Update(&'a T),
    Delete(EntityId),
}

/// Aggregate applied to each group of child records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Count,
    /// Sum of one integer field.
    Sum(&'static str),
}

/// Grouping request pushed down to backends that can aggregate natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupQuery {
    /// Entity type the reference column points at.
    pub parent: EntityKind,
    /// Child field holding the parent id.
    pub reference: &'static str,
    pub measure: Measure,
    /// Restricts grouping to one parent id.
    pub parent_id: Option<EntityId>,
}

/// Persistence contract for one entity collection.
pub trait StorageBackend<T: Entity>: Send + Sync {
    /// Short backend name for diagnostics (`snapshot|row|memory`).
    fn name(&self) -> &'static str;

    fn id_assignment(&self) -> IdAssignment;

    /// Loads the full collection in insertion order.
    fn read_all(&self) -> StorageResult<Vec<T>>;

    /// Persists `collection`, which already reflects `change`.
    ///
    /// Returns the id the changed record is stored under.
    fn write_all(&self, collection: &[T], change: Change<'_, T>) -> StorageResult<EntityId>;

    /// Native grouped totals, sorted by parent id.
    ///
    /// Returns `Ok(None)` when the backend cannot aggregate natively; callers
    /// then fall back to scanning `read_all`.
    fn group_totals(&self, _query: &GroupQuery) -> StorageResult<Option<Vec<(EntityId, i64)>>> {
        Ok(None)
    }
}

/// Physical layout shared by all repositories of one depot.
#[derive(Debug, Clone)]
pub enum StorageLayout {
    /// One JSON file per entity type inside the directory.
    Snapshot(PathBuf),
    /// One table per entity type on a migrated SQLite connection.
    Rows(SharedConnection),
    Memory,
}

impl StorageLayout {
    /// Builds the backend for one entity type.
    pub fn backend<T: Entity>(&self) -> StorageResult<Box<dyn StorageBackend<T>>> {
        match self {
            Self::Snapshot(dir) => Ok(Box::new(SnapshotStore::<T>::in_dir(dir))),
            Self::Rows(conn) => Ok(Box::new(RowStore::<T>::try_new(conn.clone())?)),
            Self::Memory => Ok(Box::new(MemoryStore::<T>::new())),
        }
    }
}

/// Next sequential id: one past the largest id present.
///
/// # Errors
/// - `InvalidData` when the largest id is already `EntityId::MAX`.
pub(crate) fn next_sequential_id<T: Entity>(collection: &[T]) -> StorageResult<EntityId> {
    let max = collection.iter().map(T::id).max().unwrap_or(0);
    max.checked_add(1).ok_or_else(|| {
        StorageError::InvalidData(format!("{} ids are exhausted at {max}", T::KIND))
    })
}
