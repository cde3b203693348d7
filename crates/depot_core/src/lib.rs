//! Core record store for the warehouse/marketplace domain.
//! Owns entity invariants, uniqueness and reference checks, and the
//! child-per-parent aggregation reports over pluggable storage.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, DepotConfig, LoggingConfig, StorageConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::validation::ValidationError;
pub use model::{Entity, EntityId, EntityKind, EntityPatch, Reference};
pub use repo::{EntityRepository, Lookup, RepoError, RepoResult};
pub use service::report::{AggregateRecord, Report};
pub use service::{Depot, ServiceError, ServiceResult, Stores};
pub use storage::{StorageBackend, StorageError, StorageLayout};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
