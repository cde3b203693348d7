//! In-process backend holding the collection behind a mutex.
//!
//! Useful for tests and for hosts that do not need persistence. It follows
//! the same contract as the snapshot store, including sequential ids.

use super::{Change, IdAssignment, StorageBackend, StorageError, StorageResult};
use crate::model::{Entity, EntityId};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct MemoryStore<T> {
    records: Mutex<Vec<T>>,
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self::seeded(Vec::new())
    }

    /// Starts from an existing collection.
    pub fn seeded(records: Vec<T>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    fn records(&self) -> StorageResult<MutexGuard<'_, Vec<T>>> {
        self.records.lock().map_err(|_| {
            StorageError::InvalidData(format!("{} memory store is poisoned", T::KIND))
        })
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> StorageBackend<T> for MemoryStore<T> {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn id_assignment(&self) -> IdAssignment {
        IdAssignment::Sequential
    }

    fn read_all(&self) -> StorageResult<Vec<T>> {
        Ok(self.records()?.clone())
    }

    fn write_all(&self, collection: &[T], change: Change<'_, T>) -> StorageResult<EntityId> {
        *self.records()? = collection.to_vec();
        Ok(match change {
            Change::Insert(record) | Change::Update(record) => record.id(),
            Change::Delete(id) => id,
        })
    }
}
