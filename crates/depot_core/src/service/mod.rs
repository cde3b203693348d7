//! Use-case services over entity repositories.
//!
//! # Responsibility
//! - Orchestrate reference checks, repository writes, and reports.
//! - Collapse repository/storage failures into one caller-facing taxonomy.
//!
//! # Invariants
//! - Expected outcomes (`NotFound`, `Conflict`, `Validation`) are returned,
//!   never panicked; storage failures pass through unchanged and are never
//!   retried.

use crate::model::validation::ValidationError;
use crate::model::{EntityId, EntityKind};
use crate::repo::RepoError;
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod depot;
pub mod reference;
pub mod report;

pub use depot::{Depot, Stores};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing failure of a depot use case.
#[derive(Debug)]
pub enum ServiceError {
    /// Target record does not exist.
    NotFound { kind: EntityKind, id: EntityId },
    /// A foreign-reference field names a record that does not exist.
    MissingReference {
        field: &'static str,
        kind: EntityKind,
        id: EntityId,
    },
    /// Uniqueness-key value is already taken.
    Conflict {
        kind: EntityKind,
        field: &'static str,
        key: String,
    },
    Validation(ValidationError),
    Storage(StorageError),
}

impl ServiceError {
    /// Stable machine-readable category.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::MissingReference { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "io",
        }
    }

    /// Suggested transport status for the HTTP layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::MissingReference { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::Validation(_) => 422,
            Self::Storage(_) => 500,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::MissingReference { field, kind, id } => {
                write!(f, "referenced {kind} not found: {field}={id}")
            }
            Self::Conflict { kind, field, key } => {
                write!(f, "{kind} with {field} `{key}` already exists")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Conflict { kind, field, key } => Self::Conflict { kind, field, key },
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Storage(err) => Self::Storage(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}
