//! Repository layer over storage backends.
//!
//! # Responsibility
//! - Provide one generic CRUD repository usable for every entity type.
//! - Keep conflict checking next to the write it protects.
//!
//! # Invariants
//! - Repository writes call `Entity::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to storage transport errors.

use crate::model::validation::ValidationError;
use crate::model::{EntityId, EntityKind};
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod conflict;
pub mod entity_repo;

pub use entity_repo::{EntityRepository, Lookup};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    NotFound {
        kind: EntityKind,
        id: EntityId,
    },
    /// Another record already holds the uniqueness-key value.
    Conflict {
        kind: EntityKind,
        field: &'static str,
        key: String,
    },
    Validation(ValidationError),
    Storage(StorageError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Conflict { kind, field, key } => {
                write!(f, "{kind} with {field} `{key}` already exists")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}
