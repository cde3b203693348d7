//! Uniqueness-key conflict detection over a loaded collection.
//!
//! # Invariants
//! - Called strictly before a create/update is persisted, on the same
//!   collection snapshot the write is derived from.
//! - On the update path the record being updated never conflicts with itself.

use super::{RepoError, RepoResult};
use crate::model::{Entity, EntityId};

/// Returns the first record holding `key`, ignoring `exclude_id`.
pub fn find_conflict<'a, T: Entity>(
    collection: &'a [T],
    key: &str,
    exclude_id: Option<EntityId>,
) -> Option<&'a T> {
    collection.iter().find(|record| {
        Some(record.id()) != exclude_id && record.unique_key().as_deref() == Some(key)
    })
}

/// Fails with `RepoError::Conflict` when another record already holds `key`.
pub fn check_unique<T: Entity>(
    collection: &[T],
    key: &str,
    exclude_id: Option<EntityId>,
) -> RepoResult<()> {
    match find_conflict(collection, key, exclude_id) {
        Some(_) => Err(RepoError::Conflict {
            kind: T::KIND,
            field: T::UNIQUE_FIELD.unwrap_or("key"),
            key: key.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::check_unique;
    use crate::model::facility::Warehouse;
    use crate::repo::RepoError;

    fn warehouse(id: i64, code: &str) -> Warehouse {
        Warehouse {
            id,
            warehouse_code: code.to_string(),
            ..Warehouse::default()
        }
    }

    #[test]
    fn duplicate_key_conflicts_on_create() {
        let collection = vec![warehouse(1, "A"), warehouse(2, "B")];
        let err = check_unique(&collection, "A", None).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Conflict { field: "warehouse_code", ref key, .. } if key == "A"
        ));
        assert!(check_unique(&collection, "C", None).is_ok());
    }

    #[test]
    fn record_does_not_conflict_with_itself_on_update() {
        let collection = vec![warehouse(1, "A"), warehouse(2, "B")];
        assert!(check_unique(&collection, "A", Some(1)).is_ok());
        assert!(check_unique(&collection, "A", Some(2)).is_err());
    }
}
