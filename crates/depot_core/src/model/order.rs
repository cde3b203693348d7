//! Orders: buyer purchase orders and warehouse inbound orders.

use super::validation::{require_date, require_text, ValidationError};
use super::{Entity, EntityId, EntityKind, Reference};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: EntityId,
    /// Uniqueness key.
    pub order_number: String,
    pub order_date: String,
    pub tracking_code: String,
    pub order_status_id: i64,
    pub buyer_id: EntityId,
    pub product_record_id: EntityId,
}

entity_patch! {
    /// Partial update for `PurchaseOrder`.
    PurchaseOrderPatch => PurchaseOrder {
        order_number: String,
        order_date: String,
        tracking_code: String,
        order_status_id: i64,
        buyer_id: EntityId,
        product_record_id: EntityId,
    }
}

impl Entity for PurchaseOrder {
    type Patch = PurchaseOrderPatch;

    const KIND: EntityKind = EntityKind::PurchaseOrder;
    const FIELDS: &'static [&'static str] = &[
        "order_number",
        "order_date",
        "tracking_code",
        "order_status_id",
        "buyer_id",
        "product_record_id",
    ];
    const UNIQUE_FIELD: Option<&'static str> = Some("order_number");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.order_number.clone())
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("buyer_id", EntityKind::Buyer, self.buyer_id),
            Reference::new(
                "product_record_id",
                EntityKind::ProductRecord,
                self.product_record_id,
            ),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("order_number", &self.order_number)?;
        require_date("order_date", &self.order_date)?;
        require_text("tracking_code", &self.tracking_code)
    }
}

/// Stock arriving at a warehouse, registered by an employee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundOrder {
    pub id: EntityId,
    /// Uniqueness key.
    pub order_number: String,
    pub order_date: String,
    pub employee_id: EntityId,
    pub product_batch_id: EntityId,
    pub warehouse_id: EntityId,
}

entity_patch! {
    /// Partial update for `InboundOrder`.
    InboundOrderPatch => InboundOrder {
        order_number: String,
        order_date: String,
        employee_id: EntityId,
        product_batch_id: EntityId,
        warehouse_id: EntityId,
    }
}

impl Entity for InboundOrder {
    type Patch = InboundOrderPatch;

    const KIND: EntityKind = EntityKind::InboundOrder;
    const FIELDS: &'static [&'static str] = &[
        "order_number",
        "order_date",
        "employee_id",
        "product_batch_id",
        "warehouse_id",
    ];
    const UNIQUE_FIELD: Option<&'static str> = Some("order_number");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.order_number.clone())
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("employee_id", EntityKind::Employee, self.employee_id),
            Reference::new(
                "product_batch_id",
                EntityKind::ProductBatch,
                self.product_batch_id,
            ),
            Reference::new("warehouse_id", EntityKind::Warehouse, self.warehouse_id),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("order_number", &self.order_number)?;
        require_date("order_date", &self.order_date)
    }
}
