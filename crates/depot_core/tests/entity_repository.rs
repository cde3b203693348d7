use depot_core::db::open_db_in_memory;
use depot_core::model::facility::{Warehouse, WarehousePatch};
use depot_core::storage::{share_connection, MemoryStore, RowStore, SnapshotStore};
use depot_core::{EntityKind, EntityRepository, RepoError, ValidationError};
use tempfile::TempDir;

struct Backend {
    name: &'static str,
    repo: EntityRepository<Warehouse>,
    _dir: Option<TempDir>,
}

fn backends() -> Vec<Backend> {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = EntityRepository::new(SnapshotStore::<Warehouse>::in_dir(dir.path()));
    let conn = share_connection(open_db_in_memory().unwrap());
    let rows = EntityRepository::new(RowStore::<Warehouse>::try_new(conn).unwrap());

    vec![
        Backend {
            name: "memory",
            repo: EntityRepository::new(MemoryStore::<Warehouse>::new()),
            _dir: None,
        },
        Backend {
            name: "snapshot",
            repo: snapshot,
            _dir: Some(dir),
        },
        Backend {
            name: "row",
            repo: rows,
            _dir: None,
        },
    ]
}

fn warehouse(code: &str) -> Warehouse {
    Warehouse {
        id: 0,
        warehouse_code: code.to_string(),
        address: "Av. Corrientes 1234".to_string(),
        telephone: "+54 11 5555-0101".to_string(),
        minimum_capacity: 25,
        minimum_temperature: 3.5,
        locality_id: 0,
    }
}

#[test]
fn created_record_reads_back_equal() {
    for backend in backends() {
        let created = backend.repo.create(warehouse("W-01")).unwrap();
        assert_eq!(created.id, 1, "backend {}", backend.name);

        let loaded = backend.repo.get_by_id(created.id).unwrap();
        assert_eq!(loaded, created, "backend {}", backend.name);
    }
}

#[test]
fn duplicate_key_conflicts_and_next_id_continues() {
    for backend in backends() {
        let repo = &backend.repo;
        assert_eq!(repo.create(warehouse("A")).unwrap().id, 1);
        assert_eq!(repo.create(warehouse("B")).unwrap().id, 2);

        let err = repo.create(warehouse("A")).unwrap_err();
        match err {
            RepoError::Conflict { field, key, .. } => {
                assert_eq!(field, "warehouse_code");
                assert_eq!(key, "A");
            }
            other => panic!("backend {}: unexpected error: {other}", backend.name),
        }
        assert_eq!(repo.get_all().unwrap().len(), 2, "backend {}", backend.name);

        let created = repo.create(warehouse("C")).unwrap();
        assert_eq!(created.id, 3, "backend {}", backend.name);
        assert_eq!(created.warehouse_code, "C");
    }
}

#[test]
fn update_changes_only_patched_fields() {
    for backend in backends() {
        let before = backend.repo.create(warehouse("W-01")).unwrap();
        let patch = WarehousePatch {
            address: Some("Calle Falsa 123".to_string()),
            ..WarehousePatch::default()
        };

        let after = backend.repo.update(before.id, &patch).unwrap();

        assert_eq!(after.address, "Calle Falsa 123", "backend {}", backend.name);
        assert_eq!(
            Warehouse {
                address: before.address.clone(),
                ..after.clone()
            },
            before,
            "backend {}",
            backend.name
        );
        assert_eq!(backend.repo.get_by_id(before.id).unwrap(), after);
    }
}

#[test]
fn explicit_zero_overwrites_stored_value() {
    for backend in backends() {
        let before = backend.repo.create(warehouse("W-01")).unwrap();
        let patch = WarehousePatch {
            minimum_capacity: Some(0),
            minimum_temperature: Some(0.0),
            ..WarehousePatch::default()
        };

        let after = backend.repo.update(before.id, &patch).unwrap();

        assert_eq!(after.minimum_capacity, 0, "backend {}", backend.name);
        assert_eq!(after.minimum_temperature, 0.0, "backend {}", backend.name);
    }
}

#[test]
fn empty_patch_returns_unchanged_record() {
    for backend in backends() {
        let before = backend.repo.create(warehouse("W-01")).unwrap();
        let after = backend
            .repo
            .update(before.id, &WarehousePatch::default())
            .unwrap();
        assert_eq!(after, before, "backend {}", backend.name);
    }
}

#[test]
fn update_rejects_missing_id_taken_key_and_invalid_merge() {
    for backend in backends() {
        let repo = &backend.repo;
        let first = repo.create(warehouse("A")).unwrap();
        repo.create(warehouse("B")).unwrap();

        let rename = |code: &str| WarehousePatch {
            warehouse_code: Some(code.to_string()),
            ..WarehousePatch::default()
        };

        assert!(matches!(
            repo.update(42, &rename("Z")),
            Err(RepoError::NotFound { id: 42, .. })
        ));
        assert!(matches!(
            repo.update(first.id, &rename("B")),
            Err(RepoError::Conflict { .. })
        ));
        // Keeping its own key is not a conflict.
        assert!(repo.update(first.id, &rename("A")).is_ok());
        assert!(matches!(
            repo.update(
                first.id,
                &WarehousePatch {
                    minimum_capacity: Some(-1),
                    ..WarehousePatch::default()
                }
            ),
            Err(RepoError::Validation(ValidationError::Negative { .. }))
        ));
        assert_eq!(repo.get_by_id(first.id).unwrap().minimum_capacity, 25);
    }
}

#[test]
fn delete_removes_record_and_keeps_order() {
    for backend in backends() {
        let repo = &backend.repo;
        for code in ["A", "B", "C"] {
            repo.create(warehouse(code)).unwrap();
        }

        repo.delete(2).unwrap();

        let codes: Vec<_> = repo
            .get_all()
            .unwrap()
            .into_iter()
            .map(|record| record.warehouse_code)
            .collect();
        assert_eq!(codes, vec!["A", "C"], "backend {}", backend.name);
        assert!(matches!(
            repo.get_by_id(2),
            Err(RepoError::NotFound { id: 2, .. })
        ));
        assert!(matches!(
            repo.delete(2),
            Err(RepoError::NotFound { id: 2, .. })
        ));

        // Deleted ids are never handed out again while higher ids exist.
        assert_eq!(repo.create(warehouse("D")).unwrap().id, 4);
        assert_eq!(repo.last_id().unwrap(), 4);
    }
}

#[test]
fn invalid_record_is_not_persisted() {
    for backend in backends() {
        let mut record = warehouse("W-01");
        record.telephone = "call me".to_string();

        assert!(matches!(
            backend.repo.create(record),
            Err(RepoError::Validation(ValidationError::InvalidTelephone(_)))
        ));
        assert!(backend.repo.get_all().unwrap().is_empty());
    }
}

#[test]
fn update_keeps_insertion_order() {
    for backend in backends() {
        let repo = &backend.repo;
        for code in ["A", "B", "C"] {
            repo.create(warehouse(code)).unwrap();
        }
        repo.update(
            2,
            &WarehousePatch {
                warehouse_code: Some("B2".to_string()),
                ..WarehousePatch::default()
            },
        )
        .unwrap();

        let ids: Vec<_> = repo.get_all().unwrap().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 2, 3], "backend {}", backend.name);
    }
}

#[test]
fn non_finite_decimals_are_rejected_and_collection_stays_readable() {
    for backend in backends() {
        let repo = &backend.repo;
        repo.create(warehouse("A")).unwrap();

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut record = warehouse("BAD");
            record.minimum_temperature = value;
            assert!(
                matches!(
                    repo.create(record),
                    Err(RepoError::Validation(ValidationError::NonFinite {
                        field: "minimum_temperature",
                        ..
                    }))
                ),
                "backend {}",
                backend.name
            );
        }
        assert!(matches!(
            repo.update(
                1,
                &WarehousePatch {
                    minimum_temperature: Some(f64::NAN),
                    ..WarehousePatch::default()
                }
            ),
            Err(RepoError::Validation(ValidationError::NonFinite { .. }))
        ));

        assert_eq!(repo.get_all().unwrap().len(), 1, "backend {}", backend.name);
        assert_eq!(repo.create(warehouse("NEXT")).unwrap().id, 2);
    }
}

#[test]
fn guarded_update_sees_validated_merge_and_can_abort() {
    for backend in backends() {
        let repo = &backend.repo;
        let stored = repo.create(warehouse("A")).unwrap();
        let relocate = WarehousePatch {
            locality_id: Some(7),
            ..WarehousePatch::default()
        };

        let refused = repo
            .update_guarded(stored.id, &relocate, |before, after| {
                assert_eq!(before.locality_id, 0);
                assert_eq!(after.locality_id, 7);
                Err(RepoError::NotFound {
                    kind: EntityKind::Locality,
                    id: 7,
                })
            })
            .unwrap_err();
        assert!(matches!(refused, RepoError::NotFound { id: 7, .. }));
        assert_eq!(repo.get_by_id(stored.id).unwrap(), stored, "backend {}", backend.name);

        let mut calls = 0;
        let invalid = WarehousePatch {
            minimum_capacity: Some(-3),
            ..WarehousePatch::default()
        };
        assert!(matches!(
            repo.update_guarded(stored.id, &invalid, |_, _| {
                calls += 1;
                Ok::<(), RepoError>(())
            }),
            Err(RepoError::Validation(_))
        ));
        repo.update_guarded(stored.id, &WarehousePatch::default(), |_, _| {
            calls += 1;
            Ok::<(), RepoError>(())
        })
        .unwrap();
        assert_eq!(calls, 0, "backend {}", backend.name);
    }
}
