//! Grouped child-per-parent aggregation reports.
//!
//! # Responsibility
//! - Compute one total per parent (count or field sum) over a child
//!   collection, optionally restricted to one parent.
//! - Decorate each total with the parent's display fields.
//!
//! # Invariants
//! - `parent_id == 0` means "no filter".
//! - Filtered report: unknown parent is `NotFound`; a parent with no
//!   children yields exactly one row with total `0`.
//! - Unfiltered report: parents with no children are omitted; children whose
//!   parent no longer exists are skipped; rows are sorted by parent id.
//! - Backend pushdown and in-process scan produce identical rows; a total
//!   that overflows `i64` is a storage error on both paths.

use super::ServiceResult;
use crate::model::facility::{Locality, Section};
use crate::model::order::{InboundOrder, PurchaseOrder};
use crate::model::party::{Buyer, Carrier, Employee, Seller};
use crate::model::product::{Product, ProductBatch, ProductRecord};
use crate::model::{Entity, EntityId};
use crate::repo::EntityRepository;
use crate::storage::{GroupQuery, Measure, StorageError, StorageResult};
use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::time::Instant;

/// Computed, never persisted, report row.
pub trait AggregateRecord {
    fn parent_id(&self) -> EntityId;
    fn count(&self) -> i64;
}

/// Describes one child → parent aggregation.
pub trait Report {
    type Child: Entity;
    type Parent: Entity;
    type Row: AggregateRecord + Serialize + Debug + Clone + PartialEq;

    /// Report name used in logs.
    const NAME: &'static str;
    /// Child field holding the parent id.
    const REFERENCE: &'static str;
    const MEASURE: Measure = Measure::Count;

    fn parent_of(child: &Self::Child) -> EntityId;

    /// Contribution of one child to its parent's total.
    fn weight(_child: &Self::Child) -> i64 {
        1
    }

    fn row(parent: &Self::Parent, total: i64) -> Self::Row;
}

/// Runs report `R`, restricted to `parent_id` unless it is `0`.
///
/// # Errors
/// - `NotFound` when `parent_id` is non-zero and unknown.
/// - `Storage` when either collection cannot be read.
pub fn run_report<R: Report>(
    children: &EntityRepository<R::Child>,
    parents: &EntityRepository<R::Parent>,
    parent_id: EntityId,
) -> ServiceResult<Vec<R::Row>> {
    let started_at = Instant::now();
    let filter = (parent_id != 0).then_some(parent_id);
    let filtered_parent = match filter {
        Some(id) => Some(parents.get_by_id(id)?),
        None => None,
    };

    let query = GroupQuery {
        parent: <R::Parent as Entity>::KIND,
        reference: R::REFERENCE,
        measure: R::MEASURE,
        parent_id: filter,
    };
    let (totals, source) = match children.group_totals(&query)? {
        Some(totals) => (totals, "pushdown"),
        None => (scan_totals::<R>(&children.get_all()?, filter)?, "scan"),
    };

    let rows = match filtered_parent {
        Some(parent) => {
            let total = totals
                .iter()
                .find(|(id, _)| *id == parent.id())
                .map_or(0, |(_, total)| *total);
            vec![R::row(&parent, total)]
        }
        None => decorate::<R>(totals, parents.get_all()?),
    };

    info!(
        "event=report_run module=service status=ok report={} source={} filter={} rows={} duration_ms={}",
        R::NAME,
        source,
        parent_id,
        rows.len(),
        started_at.elapsed().as_millis()
    );
    Ok(rows)
}

fn scan_totals<R: Report>(
    children: &[R::Child],
    filter: Option<EntityId>,
) -> StorageResult<Vec<(EntityId, i64)>> {
    let mut totals = BTreeMap::new();
    for child in children {
        let parent_id = R::parent_of(child);
        if parent_id == 0 || filter.is_some_and(|wanted| wanted != parent_id) {
            continue;
        }
        let total = totals.entry(parent_id).or_insert(0_i64);
        *total = total.checked_add(R::weight(child)).ok_or_else(|| {
            StorageError::InvalidData(format!(
                "{} total for parent {parent_id} overflows",
                R::NAME
            ))
        })?;
    }
    Ok(totals.into_iter().collect())
}

fn decorate<R: Report>(totals: Vec<(EntityId, i64)>, parents: Vec<R::Parent>) -> Vec<R::Row> {
    let by_id: HashMap<EntityId, R::Parent> = parents
        .into_iter()
        .map(|parent| (parent.id(), parent))
        .collect();

    let mut orphans = 0usize;
    let mut rows = Vec::with_capacity(totals.len());
    for (parent_id, total) in totals {
        match by_id.get(&parent_id) {
            Some(parent) => rows.push(R::row(parent, total)),
            None => orphans += 1,
        }
    }
    if orphans > 0 {
        warn!(
            "event=report_run module=service status=orphans report={} skipped={}",
            R::NAME,
            orphans
        );
    }

    rows.sort_by_key(|row| row.parent_id());
    rows
}

macro_rules! aggregate_record {
    ($row:ident, $id:ident, $count:ident) => {
        impl AggregateRecord for $row {
            fn parent_id(&self) -> EntityId {
                self.$id
            }

            fn count(&self) -> i64 {
                self.$count
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyerPurchaseOrders {
    pub id: EntityId,
    pub card_number_id: String,
    pub first_name: String,
    pub last_name: String,
    pub purchase_orders_count: i64,
}
aggregate_record!(BuyerPurchaseOrders, id, purchase_orders_count);

/// Purchase orders per buyer.
pub struct BuyerPurchaseOrdersReport;

impl Report for BuyerPurchaseOrdersReport {
    type Child = PurchaseOrder;
    type Parent = Buyer;
    type Row = BuyerPurchaseOrders;

    const NAME: &'static str = "buyer_purchase_orders";
    const REFERENCE: &'static str = "buyer_id";

    fn parent_of(child: &PurchaseOrder) -> EntityId {
        child.buyer_id
    }

    fn row(parent: &Buyer, total: i64) -> BuyerPurchaseOrders {
        BuyerPurchaseOrders {
            id: parent.id,
            card_number_id: parent.card_number_id.clone(),
            first_name: parent.first_name.clone(),
            last_name: parent.last_name.clone(),
            purchase_orders_count: total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeInboundOrders {
    pub id: EntityId,
    pub card_number_id: String,
    pub first_name: String,
    pub last_name: String,
    pub warehouse_id: EntityId,
    pub inbound_orders_count: i64,
}
aggregate_record!(EmployeeInboundOrders, id, inbound_orders_count);

/// Inbound orders per employee.
pub struct EmployeeInboundOrdersReport;

impl Report for EmployeeInboundOrdersReport {
    type Child = InboundOrder;
    type Parent = Employee;
    type Row = EmployeeInboundOrders;

    const NAME: &'static str = "employee_inbound_orders";
    const REFERENCE: &'static str = "employee_id";

    fn parent_of(child: &InboundOrder) -> EntityId {
        child.employee_id
    }

    fn row(parent: &Employee, total: i64) -> EmployeeInboundOrders {
        EmployeeInboundOrders {
            id: parent.id,
            card_number_id: parent.card_number_id.clone(),
            first_name: parent.first_name.clone(),
            last_name: parent.last_name.clone(),
            warehouse_id: parent.warehouse_id,
            inbound_orders_count: total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecords {
    pub product_id: EntityId,
    pub description: String,
    pub records_count: i64,
}
aggregate_record!(ProductRecords, product_id, records_count);

/// Price records per product.
pub struct ProductRecordsReport;

impl Report for ProductRecordsReport {
    type Child = ProductRecord;
    type Parent = Product;
    type Row = ProductRecords;

    const NAME: &'static str = "product_records";
    const REFERENCE: &'static str = "product_id";

    fn parent_of(child: &ProductRecord) -> EntityId {
        child.product_id
    }

    fn row(parent: &Product, total: i64) -> ProductRecords {
        ProductRecords {
            product_id: parent.id,
            description: parent.description.clone(),
            records_count: total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionProducts {
    pub section_id: EntityId,
    pub section_number: i64,
    pub products_count: i64,
}
aggregate_record!(SectionProducts, section_id, products_count);

/// Current product quantity stored per section, summed over its batches.
pub struct SectionProductsReport;

impl Report for SectionProductsReport {
    type Child = ProductBatch;
    type Parent = Section;
    type Row = SectionProducts;

    const NAME: &'static str = "section_products";
    const REFERENCE: &'static str = "section_id";
    const MEASURE: Measure = Measure::Sum("current_quantity");

    fn parent_of(child: &ProductBatch) -> EntityId {
        child.section_id
    }

    fn weight(child: &ProductBatch) -> i64 {
        child.current_quantity
    }

    fn row(parent: &Section, total: i64) -> SectionProducts {
        SectionProducts {
            section_id: parent.id,
            section_number: parent.section_number,
            products_count: total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalitySellers {
    pub locality_id: EntityId,
    pub locality_name: String,
    pub sellers_count: i64,
}
aggregate_record!(LocalitySellers, locality_id, sellers_count);

/// Sellers per locality.
pub struct LocalitySellersReport;

impl Report for LocalitySellersReport {
    type Child = Seller;
    type Parent = Locality;
    type Row = LocalitySellers;

    const NAME: &'static str = "locality_sellers";
    const REFERENCE: &'static str = "locality_id";

    fn parent_of(child: &Seller) -> EntityId {
        child.locality_id
    }

    fn row(parent: &Locality, total: i64) -> LocalitySellers {
        LocalitySellers {
            locality_id: parent.id,
            locality_name: parent.locality_name.clone(),
            sellers_count: total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalityCarriers {
    pub locality_id: EntityId,
    pub locality_name: String,
    pub carriers_count: i64,
}
aggregate_record!(LocalityCarriers, locality_id, carriers_count);

/// Carriers per locality.
pub struct LocalityCarriersReport;

impl Report for LocalityCarriersReport {
    type Child = Carrier;
    type Parent = Locality;
    type Row = LocalityCarriers;

    const NAME: &'static str = "locality_carriers";
    const REFERENCE: &'static str = "locality_id";

    fn parent_of(child: &Carrier) -> EntityId {
        child.locality_id
    }

    fn row(parent: &Locality, total: i64) -> LocalityCarriers {
        LocalityCarriers {
            locality_id: parent.id,
            locality_name: parent.locality_name.clone(),
            carriers_count: total,
        }
    }
}
