//! Depot configuration.
//!
//! # Responsibility
//! - Describe which storage backend a depot runs on and whether it logs.
//! - Turn that description into a ready `StorageLayout`.

use crate::db::{open_db, open_db_in_memory};
use crate::logging::{default_log_level, LoggingError};
use crate::storage::{share_connection, StorageError, StorageLayout};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Top-level depot settings. The default is in-memory storage, no logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepotConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

/// Storage backend selection, tagged by `backend`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// One JSON snapshot file per entity type under `dir`.
    Snapshot { dir: PathBuf },
    /// SQLite database file at `path`, migrated on open.
    Sqlite { path: PathBuf },
    SqliteMemory,
    #[default]
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

fn default_level() -> String {
    default_log_level().to_string()
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Logging(LoggingError),
    Storage(StorageError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<StorageError> for ConfigError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl DepotConfig {
    pub fn from_json(payload: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&payload)
    }

    /// Opens the configured medium. SQLite media are migrated here.
    pub fn storage_layout(&self) -> Result<StorageLayout, ConfigError> {
        let layout = match &self.storage {
            StorageConfig::Snapshot { dir } => StorageLayout::Snapshot(dir.clone()),
            StorageConfig::Sqlite { path } => {
                let conn = open_db(path).map_err(StorageError::from)?;
                StorageLayout::Rows(share_connection(conn))
            }
            StorageConfig::SqliteMemory => {
                let conn = open_db_in_memory().map_err(StorageError::from)?;
                StorageLayout::Rows(share_connection(conn))
            }
            StorageConfig::Memory => StorageLayout::Memory,
        };
        Ok(layout)
    }
}
