//! JSON snapshot store: the whole collection lives in one file.
//!
//! # Invariants
//! - Missing or whitespace-only files read as an empty collection.
//! - Writes replace the file atomically (temp file in the same directory,
//!   then rename), so readers never observe a half-written snapshot.
//! - A collection whose encoding would not decode back (non-finite floats
//!   become `null`) is refused before the file is touched.
//! - Only one writer per file is supported; concurrent processes writing the
//!   same file race and the last rename wins.

use super::{Change, IdAssignment, StorageBackend, StorageError, StorageResult};
use crate::model::{Entity, EntityId};
use log::debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File-backed collection serialized as a pretty-printed JSON array.
#[derive(Debug)]
pub struct SnapshotStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> SnapshotStore<T> {
    /// Uses `<dir>/<table>.json` for the entity type.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(format!("{}.json", T::KIND.table())))
    }

    /// Uses an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T: Entity> StorageBackend<T> for SnapshotStore<T> {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn id_assignment(&self) -> IdAssignment {
        IdAssignment::Sequential
    }

    fn read_all(&self) -> StorageResult<Vec<T>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, collection: &[T], change: Change<'_, T>) -> StorageResult<EntityId> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| self.io_error(err))?;

        let encoded = serde_json::to_vec_pretty(collection).map_err(|err| {
            StorageError::InvalidData(format!("cannot encode {} snapshot: {err}", T::KIND))
        })?;
        serde_json::from_slice::<Vec<T>>(&encoded).map_err(|err| {
            StorageError::InvalidData(format!("{} snapshot would not read back: {err}", T::KIND))
        })?;

        let mut staged = NamedTempFile::new_in(&dir).map_err(|err| self.io_error(err))?;
        staged
            .write_all(&encoded)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| self.io_error(err))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;

        debug!(
            "event=snapshot_write module=storage status=ok kind={} records={} bytes={}",
            T::KIND,
            collection.len(),
            encoded.len()
        );

        Ok(match change {
            Change::Insert(record) | Change::Update(record) => record.id(),
            Change::Delete(id) => id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SnapshotStore;
    use crate::model::facility::Warehouse;
    use crate::model::party::Buyer;
    use crate::storage::{Change, StorageBackend, StorageError};
    use std::fs;

    fn buyer(id: i64, card: &str) -> Buyer {
        Buyer {
            id,
            card_number_id: card.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Lima".to_string(),
        }
    }

    #[test]
    fn missing_and_blank_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::<Buyer>::in_dir(dir.path());
        assert!(store.read_all().unwrap().is_empty());

        fs::write(store.path(), "  \n").unwrap();
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_reported_not_masked() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::<Buyer>::in_dir(dir.path());
        fs::write(store.path(), "{not json").unwrap();

        let err = store.read_all().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn write_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::<Buyer>::in_dir(dir.path().join("nested"));

        let first = vec![buyer(1, "A"), buyer(2, "B")];
        store.write_all(&first, Change::Insert(&first[1])).unwrap();
        let second = vec![buyer(2, "B")];
        store.write_all(&second, Change::Delete(1)).unwrap();

        assert_eq!(store.read_all().unwrap(), second);
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"card_number_id\": \"B\""));
    }

    #[test]
    fn unreadable_encoding_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::<Warehouse>::in_dir(dir.path());
        let good = vec![Warehouse {
            id: 1,
            warehouse_code: "W1".to_string(),
            minimum_temperature: 4.0,
            ..Warehouse::default()
        }];
        store.write_all(&good, Change::Insert(&good[0])).unwrap();

        let mut bad = good.clone();
        bad.push(Warehouse {
            id: 2,
            warehouse_code: "W2".to_string(),
            minimum_temperature: f64::NAN,
            ..Warehouse::default()
        });
        let err = store.write_all(&bad, Change::Insert(&bad[1])).unwrap_err();

        assert!(matches!(err, StorageError::InvalidData(_)));
        assert_eq!(store.read_all().unwrap(), good);
    }
}
