//! Referential validation across repositories.
//!
//! # Invariants
//! - Unset references (`id == 0`) are never resolved.
//! - Checks go through the target repository's public lookup only; no module
//!   reads another module's storage directly.

use super::{ServiceError, ServiceResult};
use crate::model::{EntityKind, Reference};
use crate::repo::Lookup;
use log::warn;

/// Confirms `reference` resolves in `target`.
pub fn check_exists(target: &dyn Lookup, reference: &Reference) -> ServiceResult<()> {
    if !reference.is_set() {
        return Ok(());
    }

    if target.contains(reference.id)? {
        return Ok(());
    }

    warn!(
        "event=reference_check module=service status=missing field={} kind={} id={}",
        reference.field,
        target.kind(),
        reference.id
    );
    Err(ServiceError::MissingReference {
        field: reference.field,
        kind: target.kind(),
        id: reference.id,
    })
}

/// Checks every reference, resolving the target repository through `resolve`.
pub fn check_all<'a, F>(resolve: F, references: &[Reference]) -> ServiceResult<()>
where
    F: Fn(EntityKind) -> &'a dyn Lookup,
{
    for reference in references {
        check_exists(resolve(reference.kind), reference)?;
    }
    Ok(())
}

/// References whose value differs between `before` and `after`.
pub fn changed_references(before: &[Reference], after: &[Reference]) -> Vec<Reference> {
    after
        .iter()
        .filter(|candidate| {
            !before
                .iter()
                .any(|previous| previous.field == candidate.field && previous.id == candidate.id)
        })
        .copied()
        .collect()
}
