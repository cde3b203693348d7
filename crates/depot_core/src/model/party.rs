//! People and companies: buyers, employees, sellers, carriers.

use super::validation::{require_non_negative, require_telephone, require_text, ValidationError};
use super::{Entity, EntityId, EntityKind, Reference};
use serde::{Deserialize, Serialize};

/// Marketplace customer placing purchase orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: EntityId,
    /// Uniqueness key.
    pub card_number_id: String,
    pub first_name: String,
    pub last_name: String,
}

entity_patch! {
    /// Partial update for `Buyer`.
    BuyerPatch => Buyer {
        card_number_id: String,
        first_name: String,
        last_name: String,
    }
}

impl Entity for Buyer {
    type Patch = BuyerPatch;

    const KIND: EntityKind = EntityKind::Buyer;
    const FIELDS: &'static [&'static str] = &["card_number_id", "first_name", "last_name"];
    const UNIQUE_FIELD: Option<&'static str> = Some("card_number_id");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.card_number_id.clone())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("card_number_id", &self.card_number_id)?;
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)
    }
}

/// Warehouse staff member registering inbound orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EntityId,
    /// Uniqueness key.
    pub card_number_id: String,
    pub first_name: String,
    pub last_name: String,
    pub warehouse_id: EntityId,
}

entity_patch! {
    /// Partial update for `Employee`.
    EmployeePatch => Employee {
        card_number_id: String,
        first_name: String,
        last_name: String,
        warehouse_id: EntityId,
    }
}

impl Entity for Employee {
    type Patch = EmployeePatch;

    const KIND: EntityKind = EntityKind::Employee;
    const FIELDS: &'static [&'static str] =
        &["card_number_id", "first_name", "last_name", "warehouse_id"];
    const UNIQUE_FIELD: Option<&'static str> = Some("card_number_id");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.card_number_id.clone())
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "warehouse_id",
            EntityKind::Warehouse,
            self.warehouse_id,
        )]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("card_number_id", &self.card_number_id)?;
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)
    }
}

/// Company listing products on the marketplace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub id: EntityId,
    /// Company identifier; uniqueness key.
    pub cid: i64,
    pub company_name: String,
    pub address: String,
    pub telephone: String,
    pub locality_id: EntityId,
}

entity_patch! {
    /// Partial update for `Seller`.
    SellerPatch => Seller {
        cid: i64,
        company_name: String,
        address: String,
        telephone: String,
        locality_id: EntityId,
    }
}

impl Entity for Seller {
    type Patch = SellerPatch;

    const KIND: EntityKind = EntityKind::Seller;
    const FIELDS: &'static [&'static str] =
        &["cid", "company_name", "address", "telephone", "locality_id"];
    const UNIQUE_FIELD: Option<&'static str> = Some("cid");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.cid.to_string())
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "locality_id",
            EntityKind::Locality,
            self.locality_id,
        )]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_negative("cid", self.cid)?;
        require_text("company_name", &self.company_name)?;
        require_text("address", &self.address)?;
        require_telephone(&self.telephone)
    }
}

/// Logistics company serving one locality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: EntityId,
    /// Carrier code; uniqueness key.
    pub cid: String,
    pub company_name: String,
    pub address: String,
    pub telephone: String,
    pub locality_id: EntityId,
}

entity_patch! {
    /// Partial update for `Carrier`.
    CarrierPatch => Carrier {
        cid: String,
        company_name: String,
        address: String,
        telephone: String,
        locality_id: EntityId,
    }
}

impl Entity for Carrier {
    type Patch = CarrierPatch;

    const KIND: EntityKind = EntityKind::Carrier;
    const FIELDS: &'static [&'static str] =
        &["cid", "company_name", "address", "telephone", "locality_id"];
    const UNIQUE_FIELD: Option<&'static str> = Some("cid");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.cid.clone())
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "locality_id",
            EntityKind::Locality,
            self.locality_id,
        )]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("cid", &self.cid)?;
        require_text("company_name", &self.company_name)?;
        require_text("address", &self.address)?;
        require_telephone(&self.telephone)
    }
}
