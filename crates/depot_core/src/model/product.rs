//! Catalogue and stock: products, price records, and product batches.

use super::validation::{
    require_date, require_finite, require_non_negative, require_text, require_within,
    ValidationError,
};
use super::{Entity, EntityId, EntityKind, Reference};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    /// Uniqueness key.
    pub product_code: String,
    pub description: String,
    pub width: f64,
    pub height: f64,
    pub length: f64,
    pub net_weight: f64,
    pub expiration_rate: f64,
    pub recommended_freezing_temperature: f64,
    pub freezing_rate: f64,
    pub product_type_id: i64,
    pub seller_id: EntityId,
}

entity_patch! {
    /// Partial update for `Product`.
    ProductPatch => Product {
        product_code: String,
        description: String,
        width: f64,
        height: f64,
        length: f64,
        net_weight: f64,
        expiration_rate: f64,
        recommended_freezing_temperature: f64,
        freezing_rate: f64,
        product_type_id: i64,
        seller_id: EntityId,
    }
}

impl Entity for Product {
    type Patch = ProductPatch;

    const KIND: EntityKind = EntityKind::Product;
    const FIELDS: &'static [&'static str] = &[
        "product_code",
        "description",
        "width",
        "height",
        "length",
        "net_weight",
        "expiration_rate",
        "recommended_freezing_temperature",
        "freezing_rate",
        "product_type_id",
        "seller_id",
    ];
    const UNIQUE_FIELD: Option<&'static str> = Some("product_code");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.product_code.clone())
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new("seller_id", EntityKind::Seller, self.seller_id)]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("product_code", &self.product_code)?;
        require_text("description", &self.description)?;
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("length", self.length),
            ("net_weight", self.net_weight),
            ("expiration_rate", self.expiration_rate),
            (
                "recommended_freezing_temperature",
                self.recommended_freezing_temperature,
            ),
            ("freezing_rate", self.freezing_rate),
        ] {
            require_finite(field, value)?;
        }
        Ok(())
    }
}

/// Price snapshot of one product at a given date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: EntityId,
    pub last_update_date: String,
    pub purchase_price: f64,
    pub sale_price: f64,
    pub product_id: EntityId,
}

entity_patch! {
    /// Partial update for `ProductRecord`.
    ProductRecordPatch => ProductRecord {
        last_update_date: String,
        purchase_price: f64,
        sale_price: f64,
        product_id: EntityId,
    }
}

impl Entity for ProductRecord {
    type Patch = ProductRecordPatch;

    const KIND: EntityKind = EntityKind::ProductRecord;
    const FIELDS: &'static [&'static str] =
        &["last_update_date", "purchase_price", "sale_price", "product_id"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            "product_id",
            EntityKind::Product,
            self.product_id,
        )]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_date("last_update_date", &self.last_update_date)?;
        require_finite("purchase_price", self.purchase_price)?;
        require_finite("sale_price", self.sale_price)
    }
}

/// Stocked quantity of one product placed in one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductBatch {
    pub id: EntityId,
    /// Uniqueness key.
    pub batch_number: i64,
    pub current_quantity: i64,
    pub current_temperature: f64,
    pub due_date: String,
    pub initial_quantity: i64,
    pub manufacturing_date: String,
    pub manufacturing_hour: i64,
    pub minimum_temperature: f64,
    pub product_id: EntityId,
    pub section_id: EntityId,
}

entity_patch! {
    /// Partial update for `ProductBatch`.
    ProductBatchPatch => ProductBatch {
        batch_number: i64,
        current_quantity: i64,
        current_temperature: f64,
        due_date: String,
        initial_quantity: i64,
        manufacturing_date: String,
        manufacturing_hour: i64,
        minimum_temperature: f64,
        product_id: EntityId,
        section_id: EntityId,
    }
}

impl Entity for ProductBatch {
    type Patch = ProductBatchPatch;

    const KIND: EntityKind = EntityKind::ProductBatch;
    const FIELDS: &'static [&'static str] = &[
        "batch_number",
        "current_quantity",
        "current_temperature",
        "due_date",
        "initial_quantity",
        "manufacturing_date",
        "manufacturing_hour",
        "minimum_temperature",
        "product_id",
        "section_id",
    ];
    const UNIQUE_FIELD: Option<&'static str> = Some("batch_number");

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.batch_number.to_string())
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("product_id", EntityKind::Product, self.product_id),
            Reference::new("section_id", EntityKind::Section, self.section_id),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_negative("batch_number", self.batch_number)?;
        require_non_negative("current_quantity", self.current_quantity)?;
        require_non_negative("initial_quantity", self.initial_quantity)?;
        require_finite("current_temperature", self.current_temperature)?;
        require_finite("minimum_temperature", self.minimum_temperature)?;
        require_date("due_date", &self.due_date)?;
        require_date("manufacturing_date", &self.manufacturing_date)?;
        require_within("manufacturing_hour", self.manufacturing_hour, 0, 23)
    }
}
