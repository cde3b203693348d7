//! Entity model for the warehouse/marketplace record store.
//!
//! # Responsibility
//! - Define the `Entity` contract every stored record type implements.
//! - Define partial-update payloads (`EntityPatch`) with explicit presence.
//!
//! # Invariants
//! - `id` is owned by the storage layer and never appears in a patch.
//! - A foreign reference holding `0` means "not set" and is never resolved.
//! - `FIELDS` lists persisted field names (excluding `id`) in column order and
//!   matches the serde field names exactly.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Generates an `Option`-per-field patch type and its `EntityPatch` impl.
///
/// Every listed field must exist on the target entity with the same type.
macro_rules! entity_patch {
    (
        $(#[$meta:meta])*
        $patch:ident => $entity:ident {
            $($field:ident: $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        pub struct $patch {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl $crate::model::EntityPatch<$entity> for $patch {
            fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())+
            }

            fn changed_fields(&self) -> Vec<&'static str> {
                let mut fields = Vec::new();
                $(
                    if self.$field.is_some() {
                        fields.push(stringify!($field));
                    }
                )+
                fields
            }

            fn apply_to(&self, target: &mut $entity) {
                $(
                    if let Some(value) = &self.$field {
                        target.$field = value.clone();
                    }
                )+
            }
        }
    };
}

pub mod facility;
pub mod order;
pub mod party;
pub mod product;
pub mod validation;

use validation::ValidationError;

/// Integer identity shared by every entity type.
pub type EntityId = i64;

/// Closed set of stored entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Locality,
    Warehouse,
    Section,
    Seller,
    Carrier,
    Product,
    ProductRecord,
    ProductBatch,
    Buyer,
    Employee,
    PurchaseOrder,
    InboundOrder,
}

impl EntityKind {
    pub const ALL: [EntityKind; 12] = [
        Self::Locality,
        Self::Warehouse,
        Self::Section,
        Self::Seller,
        Self::Carrier,
        Self::Product,
        Self::ProductRecord,
        Self::ProductBatch,
        Self::Buyer,
        Self::Employee,
        Self::PurchaseOrder,
        Self::InboundOrder,
    ];

    /// Stable singular name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locality => "locality",
            Self::Warehouse => "warehouse",
            Self::Section => "section",
            Self::Seller => "seller",
            Self::Carrier => "carrier",
            Self::Product => "product",
            Self::ProductRecord => "product_record",
            Self::ProductBatch => "product_batch",
            Self::Buyer => "buyer",
            Self::Employee => "employee",
            Self::PurchaseOrder => "purchase_order",
            Self::InboundOrder => "inbound_order",
        }
    }

    /// Table name for the row store and file stem for the snapshot store.
    pub fn table(self) -> &'static str {
        match self {
            Self::Locality => "localities",
            Self::Warehouse => "warehouses",
            Self::Section => "sections",
            Self::Seller => "sellers",
            Self::Carrier => "carriers",
            Self::Product => "products",
            Self::ProductRecord => "product_records",
            Self::ProductBatch => "product_batches",
            Self::Buyer => "buyers",
            Self::Employee => "employees",
            Self::PurchaseOrder => "purchase_orders",
            Self::InboundOrder => "inbound_orders",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One foreign-reference field value on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Field name on the referencing record.
    pub field: &'static str,
    /// Entity type the field points at.
    pub kind: EntityKind,
    /// Referenced id; `0` means unset.
    pub id: EntityId,
}

impl Reference {
    pub fn new(field: &'static str, kind: EntityKind, id: EntityId) -> Self {
        Self { field, kind, id }
    }

    pub fn is_set(&self) -> bool {
        self.id != 0
    }
}

/// Contract implemented by every stored record type.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Partial-update payload for this type.
    type Patch: EntityPatch<Self>;

    const KIND: EntityKind;

    /// Persisted field names, excluding `id`, in column order.
    const FIELDS: &'static [&'static str];

    /// Name of the uniqueness-key field, when the type has one.
    const UNIQUE_FIELD: Option<&'static str> = None;

    fn id(&self) -> EntityId;

    fn set_id(&mut self, id: EntityId);

    /// Value of the uniqueness key rendered as text.
    fn unique_key(&self) -> Option<String> {
        None
    }

    /// Foreign references carried by this record, set or not.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Checks field-level rules on a complete record.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Partial-update payload for one entity type.
///
/// Absent fields are left untouched. Present fields overwrite, including
/// zero numbers and empty strings.
pub trait EntityPatch<T>: Debug + Clone + Default + DeserializeOwned + Send {
    fn is_empty(&self) -> bool;

    /// Names of the fields this patch overwrites.
    fn changed_fields(&self) -> Vec<&'static str>;

    fn apply_to(&self, target: &mut T);

    /// Decodes a patch from a JSON object payload.
    ///
    /// # Errors
    /// - Unknown fields (including `id`) and wrongly typed values return
    ///   `ValidationError::MalformedPayload`.
    fn from_json(payload: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(payload)
            .map_err(|err| ValidationError::MalformedPayload(err.to_string()))
    }
}
