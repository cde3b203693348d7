//! Physical locations: localities, warehouses, and warehouse sections.

use super::validation::{
    require_finite, require_non_negative, require_ordered, require_telephone, require_text,
    ValidationError,
};
use super::{Entity, EntityId, EntityKind, Reference};
use serde::{Deserialize, Serialize};

/// Geographic area grouping sellers, carriers, and warehouses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub id: EntityId,
    pub locality_name: String,
    pub province_name: String,
    pub country_name: String,
}

entity_patch! {
    /// Partial update for `Locality`.
    LocalityPatch => Locality {
        locality_name: String,
        province_name: String,
        country_name: String,
    }
}

impl Entity for Locality {
    type Patch = LocalityPatch;

    const KIND: EntityKind = EntityKind::Locality;
    const FIELDS: &'static [&'static str] = &["locality_name", "province_name", "country_name"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("locality_name", &self.locality_name)?;
        require_text("province_name", &self.province_name)?;
        require_text("country_name", &self.country_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: EntityId,
    /// Uniqueness key.
    pub warehouse_code: String,
    pub address: String,
    pub telephone: String,
    pub minimum_capacity: i64,
    pub minimum_temperature: f64,
    pub locality_id: EntityId,
}

entity_patch! {
    /// Partial update for `Warehouse`.
    WarehousePatch => Warehouse {
        warehouse_code: String,
        address: String,
        telephone: String,
        minimum_capacity: i64,
        minimum_temperature: f64,
        locality_id: EntityId,
    }
}

impl Entity for Warehouse {
    type Patch = WarehousePatch;

    const KIND: EntityKind = EntityKind::Warehouse;
    const FIELDS: &'static [&'static str] = &[
        "warehouse_code",
        "address",
        "telephone",
        "minimum_capacity",
        "minimum_temperature",
        "locality_id",
    ];
    const UNIQUE_FIELD: Option<&'static str> = Some("warehouse_code");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.warehouse_code.clone())
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "locality_id",
            EntityKind::Locality,
            self.locality_id,
        )]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("warehouse_code", &self.warehouse_code)?;
        require_text("address", &self.address)?;
        require_telephone(&self.telephone)?;
        require_non_negative("minimum_capacity", self.minimum_capacity)?;
        require_finite("minimum_temperature", self.minimum_temperature)
    }
}

/// Storage zone inside a warehouse holding product batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: EntityId,
    /// Uniqueness key.
    pub section_number: i64,
    pub current_temperature: f64,
    pub minimum_temperature: f64,
    pub current_capacity: i64,
    pub minimum_capacity: i64,
    pub maximum_capacity: i64,
    pub warehouse_id: EntityId,
    pub product_type_id: i64,
}

entity_patch! {
    /// Partial update for `Section`.
    SectionPatch => Section {
        section_number: i64,
        current_temperature: f64,
        minimum_temperature: f64,
        current_capacity: i64,
        minimum_capacity: i64,
        maximum_capacity: i64,
        warehouse_id: EntityId,
        product_type_id: i64,
    }
}

impl Entity for Section {
    type Patch = SectionPatch;

    const KIND: EntityKind = EntityKind::Section;
    const FIELDS: &'static [&'static str] = &[
        "section_number",
        "current_temperature",
        "minimum_temperature",
        "current_capacity",
        "minimum_capacity",
        "maximum_capacity",
        "warehouse_id",
        "product_type_id",
    ];
    const UNIQUE_FIELD: Option<&'static str> = Some("section_number");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.section_number.to_string())
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "warehouse_id",
            EntityKind::Warehouse,
            self.warehouse_id,
        )]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_negative("section_number", self.section_number)?;
        require_finite("current_temperature", self.current_temperature)?;
        require_finite("minimum_temperature", self.minimum_temperature)?;
        require_non_negative("current_capacity", self.current_capacity)?;
        require_non_negative("minimum_capacity", self.minimum_capacity)?;
        require_ordered(
            ("minimum_capacity", self.minimum_capacity),
            ("maximum_capacity", self.maximum_capacity),
        )
    }
}
