//! Generic entity repository over a storage backend.
//!
//! # Responsibility
//! - Provide scan, lookup, create, partial update, and delete for any
//!   `Entity` type on any `StorageBackend`.
//! - Enforce record validation and uniqueness before every write.
//!
//! # Invariants
//! - Writers of one repository are serialized by the write gate: the
//!   read → conflict check → persist sequence never interleaves in-process.
//! - Insertion order is preserved; updates replace in place.
//! - An empty patch never writes.

use super::conflict::check_unique;
use super::{RepoError, RepoResult};
use crate::model::{Entity, EntityId, EntityKind, EntityPatch};
use crate::storage::{
    next_sequential_id, Change, GroupQuery, IdAssignment, StorageBackend, StorageError,
};
use log::{error, info, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Object-safe existence check used by cross-repository reference checks.
pub trait Lookup {
    fn kind(&self) -> EntityKind;
    fn contains(&self, id: EntityId) -> RepoResult<bool>;
}

/// Repository for one entity type.
pub struct EntityRepository<T: Entity> {
    backend: Box<dyn StorageBackend<T>>,
    write_gate: Mutex<()>,
}

impl<T: Entity> EntityRepository<T> {
    pub fn new(backend: impl StorageBackend<T> + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn StorageBackend<T>>) -> Self {
        Self {
            backend,
            write_gate: Mutex::new(()),
        }
    }

    /// Backend name for diagnostics.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Returns every record in insertion order.
    pub fn get_all(&self) -> RepoResult<Vec<T>> {
        Ok(self.backend.read_all()?)
    }

    /// Returns the record with `id`, or `NotFound`.
    pub fn get_by_id(&self, id: EntityId) -> RepoResult<T> {
        self.get_all()?
            .into_iter()
            .find(|record| record.id() == id)
            .ok_or(RepoError::NotFound { kind: T::KIND, id })
    }

    /// Id of the last record in insertion order, `0` when empty.
    pub fn last_id(&self) -> RepoResult<EntityId> {
        Ok(self.get_all()?.last().map_or(0, T::id))
    }

    /// Validates, checks uniqueness, assigns an id, and persists `record`.
    ///
    /// Any id carried by `record` is ignored.
    ///
    /// # Errors
    /// - `Validation` when the record breaks a field rule.
    /// - `Conflict` when another record holds the same uniqueness key.
    /// - `Storage` when the backend cannot read or persist the collection.
    pub fn create(&self, mut record: T) -> RepoResult<T> {
        let started_at = Instant::now();
        record.validate()?;

        let _gate = self.lock_writes();
        let mut collection = self.backend.read_all()?;
        let key = record.unique_key();
        if let Some(key) = key.as_deref() {
            self.ensure_unique(&collection, key, None, "entity_create")?;
        }

        let assigned = match self.backend.id_assignment() {
            IdAssignment::Sequential => next_sequential_id(&collection)?,
            IdAssignment::Generated => 0,
        };
        record.set_id(assigned);
        collection.push(record.clone());

        let stored_id = self
            .backend
            .write_all(&collection, Change::Insert(&record))
            .map_err(|err| self.write_failure("entity_create", err, key))?;
        record.set_id(stored_id);

        info!(
            "event=entity_create module=repo status=ok kind={} backend={} id={} duration_ms={}",
            T::KIND,
            self.backend.name(),
            stored_id,
            started_at.elapsed().as_millis()
        );
        Ok(record)
    }

    /// Applies `patch` to the record with `id` and persists the result.
    ///
    /// Only fields present in the patch change. An empty patch returns the
    /// stored record untouched.
    ///
    /// # Errors
    /// - `NotFound` when no record has `id`.
    /// - `Validation` when the merged record breaks a field rule.
    /// - `Conflict` when the new uniqueness key belongs to another record.
    /// - `Storage` on backend failure.
    pub fn update(&self, id: EntityId, patch: &T::Patch) -> RepoResult<T> {
        self.update_guarded(id, patch, |_, _| Ok::<(), RepoError>(()))
    }

    /// Like [`Self::update`], but runs `guard(stored, merged)` on the
    /// validated merge before the uniqueness check and the write.
    ///
    /// The guard runs under the write gate and is skipped for empty patches.
    /// Its error aborts the update with nothing persisted.
    pub fn update_guarded<E, G>(&self, id: EntityId, patch: &T::Patch, guard: G) -> Result<T, E>
    where
        E: From<RepoError>,
        G: FnOnce(&T, &T) -> Result<(), E>,
    {
        let started_at = Instant::now();
        let _gate = self.lock_writes();
        let mut collection = self.backend.read_all().map_err(RepoError::from)?;
        let index = position_of(&collection, id)?;
        if patch.is_empty() {
            return Ok(collection.swap_remove(index));
        }

        let mut merged = collection[index].clone();
        patch.apply_to(&mut merged);
        merged.validate().map_err(RepoError::from)?;
        guard(&collection[index], &merged)?;
        let key = merged.unique_key();
        if let Some(key) = key.as_deref() {
            self.ensure_unique(&collection, key, Some(id), "entity_update")?;
        }

        collection[index] = merged.clone();
        self.backend
            .write_all(&collection, Change::Update(&merged))
            .map_err(|err| self.write_failure("entity_update", err, key))?;

        info!(
            "event=entity_update module=repo status=ok kind={} backend={} id={} fields={} duration_ms={}",
            T::KIND,
            self.backend.name(),
            id,
            patch.changed_fields().join(","),
            started_at.elapsed().as_millis()
        );
        Ok(merged)
    }

    /// Removes the record with `id`, keeping the order of the rest.
    pub fn delete(&self, id: EntityId) -> RepoResult<()> {
        let started_at = Instant::now();
        let _gate = self.lock_writes();
        let mut collection = self.backend.read_all()?;
        let index = position_of(&collection, id)?;
        collection.remove(index);

        self.backend
            .write_all(&collection, Change::Delete(id))
            .map_err(|err| self.write_failure("entity_delete", err, None))?;

        info!(
            "event=entity_delete module=repo status=ok kind={} backend={} id={} duration_ms={}",
            T::KIND,
            self.backend.name(),
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Native grouped totals when the backend supports them.
    pub fn group_totals(&self, query: &GroupQuery) -> RepoResult<Option<Vec<(EntityId, i64)>>> {
        Ok(self.backend.group_totals(query)?)
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        // The gate guards no data, so a poisoned lock is still usable.
        self.write_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_unique(
        &self,
        collection: &[T],
        key: &str,
        exclude_id: Option<EntityId>,
        event: &'static str,
    ) -> RepoResult<()> {
        check_unique(collection, key, exclude_id).map_err(|err| {
            warn!(
                "event={event} module=repo status=conflict kind={} backend={} field={}",
                T::KIND,
                self.backend.name(),
                T::UNIQUE_FIELD.unwrap_or("key")
            );
            err
        })
    }

    fn write_failure(&self, event: &'static str, err: StorageError, key: Option<String>) -> RepoError {
        match err {
            StorageError::UniqueViolation { kind, .. } => {
                warn!(
                    "event={event} module=repo status=conflict kind={kind} backend={} source=storage_constraint",
                    self.backend.name()
                );
                RepoError::Conflict {
                    kind,
                    field: T::UNIQUE_FIELD.unwrap_or("key"),
                    key: key.unwrap_or_default(),
                }
            }
            StorageError::MissingRow { kind, id } => RepoError::NotFound { kind, id },
            other => {
                error!(
                    "event={event} module=repo status=error kind={} backend={} error={other}",
                    T::KIND,
                    self.backend.name()
                );
                RepoError::Storage(other)
            }
        }
    }
}

impl<T: Entity> Lookup for EntityRepository<T> {
    fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn contains(&self, id: EntityId) -> RepoResult<bool> {
        Ok(self.get_all()?.iter().any(|record| record.id() == id))
    }
}

fn position_of<T: Entity>(collection: &[T], id: EntityId) -> RepoResult<usize> {
    collection
        .iter()
        .position(|record| record.id() == id)
        .ok_or(RepoError::NotFound { kind: T::KIND, id })
}
