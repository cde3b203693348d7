//! Service facade over every entity repository.
//!
//! # Responsibility
//! - Own one repository per entity type on a shared storage layout.
//! - Run referential checks before repository writes.
//! - Expose the aggregation reports.
//!
//! # Invariants
//! - `create` resolves every set reference; `update` resolves only the
//!   references whose value the patch changes.
//! - Validation failures are reported before reference failures.
//! - Deletes do not cascade and do not check inbound references.

use super::reference::{changed_references, check_all};
use super::report::{run_report, Report};
use super::ServiceResult;
use crate::config::{ConfigError, DepotConfig};
use crate::logging::init_logging;
use crate::model::facility::{Locality, Section, Warehouse};
use crate::model::order::{InboundOrder, PurchaseOrder};
use crate::model::party::{Buyer, Carrier, Employee, Seller};
use crate::model::product::{Product, ProductBatch, ProductRecord};
use crate::model::{Entity, EntityId, EntityKind};
use crate::repo::{EntityRepository, Lookup};
use crate::storage::{MemoryStore, StorageLayout, StorageResult};
use log::info;

fn memory_repository<T: Entity>() -> EntityRepository<T> {
    EntityRepository::new(MemoryStore::<T>::new())
}

/// Typed access to the repository holding `T`.
pub trait Stores<T: Entity> {
    fn repository(&self) -> &EntityRepository<T>;
}

/// Record store for the whole warehouse/marketplace domain.
pub struct Depot {
    localities: EntityRepository<Locality>,
    warehouses: EntityRepository<Warehouse>,
    sections: EntityRepository<Section>,
    sellers: EntityRepository<Seller>,
    carriers: EntityRepository<Carrier>,
    products: EntityRepository<Product>,
    product_records: EntityRepository<ProductRecord>,
    product_batches: EntityRepository<ProductBatch>,
    buyers: EntityRepository<Buyer>,
    employees: EntityRepository<Employee>,
    purchase_orders: EntityRepository<PurchaseOrder>,
    inbound_orders: EntityRepository<InboundOrder>,
}

macro_rules! stores {
    ($($entity:ty => $field:ident),+ $(,)?) => {
        $(
            impl Stores<$entity> for Depot {
                fn repository(&self) -> &EntityRepository<$entity> {
                    &self.$field
                }
            }
        )+
    };
}

stores! {
    Locality => localities,
    Warehouse => warehouses,
    Section => sections,
    Seller => sellers,
    Carrier => carriers,
    Product => products,
    ProductRecord => product_records,
    ProductBatch => product_batches,
    Buyer => buyers,
    Employee => employees,
    PurchaseOrder => purchase_orders,
    InboundOrder => inbound_orders,
}

impl Depot {
    /// Builds every repository on `layout`.
    ///
    /// # Errors
    /// - Row layouts fail when the connection is not migrated.
    pub fn with_layout(layout: &StorageLayout) -> StorageResult<Self> {
        Ok(Self {
            localities: EntityRepository::from_boxed(layout.backend()?),
            warehouses: EntityRepository::from_boxed(layout.backend()?),
            sections: EntityRepository::from_boxed(layout.backend()?),
            sellers: EntityRepository::from_boxed(layout.backend()?),
            carriers: EntityRepository::from_boxed(layout.backend()?),
            products: EntityRepository::from_boxed(layout.backend()?),
            product_records: EntityRepository::from_boxed(layout.backend()?),
            product_batches: EntityRepository::from_boxed(layout.backend()?),
            buyers: EntityRepository::from_boxed(layout.backend()?),
            employees: EntityRepository::from_boxed(layout.backend()?),
            purchase_orders: EntityRepository::from_boxed(layout.backend()?),
            inbound_orders: EntityRepository::from_boxed(layout.backend()?),
        })
    }

    /// Empty depot held in process memory.
    pub fn in_memory() -> Self {
        Self {
            localities: memory_repository(),
            warehouses: memory_repository(),
            sections: memory_repository(),
            sellers: memory_repository(),
            carriers: memory_repository(),
            products: memory_repository(),
            product_records: memory_repository(),
            product_batches: memory_repository(),
            buyers: memory_repository(),
            employees: memory_repository(),
            purchase_orders: memory_repository(),
            inbound_orders: memory_repository(),
        }
    }

    /// Starts logging when configured, then opens the configured storage.
    pub fn open(config: &DepotConfig) -> Result<Self, ConfigError> {
        if let Some(logging) = &config.logging {
            init_logging(&logging.level, &logging.log_dir)?;
        }
        let layout = config.storage_layout()?;
        let depot = Self::with_layout(&layout)?;
        info!(
            "event=depot_open module=service status=ok backend={}",
            depot.localities.backend_name()
        );
        Ok(depot)
    }

    /// Existence check for the repository holding `kind`.
    pub fn lookup(&self, kind: EntityKind) -> &dyn Lookup {
        match kind {
            EntityKind::Locality => &self.localities,
            EntityKind::Warehouse => &self.warehouses,
            EntityKind::Section => &self.sections,
            EntityKind::Seller => &self.sellers,
            EntityKind::Carrier => &self.carriers,
            EntityKind::Product => &self.products,
            EntityKind::ProductRecord => &self.product_records,
            EntityKind::ProductBatch => &self.product_batches,
            EntityKind::Buyer => &self.buyers,
            EntityKind::Employee => &self.employees,
            EntityKind::PurchaseOrder => &self.purchase_orders,
            EntityKind::InboundOrder => &self.inbound_orders,
        }
    }

    /// Creates `record` after checking every set reference.
    ///
    /// # Errors
    /// - `Validation`, then `MissingReference`, then `Conflict`, in that order.
    pub fn create<T: Entity>(&self, record: T) -> ServiceResult<T>
    where
        Self: Stores<T>,
    {
        record.validate()?;
        check_all(|kind| self.lookup(kind), &record.references())?;
        Ok(<Self as Stores<T>>::repository(self).create(record)?)
    }

    pub fn get<T: Entity>(&self, id: EntityId) -> ServiceResult<T>
    where
        Self: Stores<T>,
    {
        Ok(<Self as Stores<T>>::repository(self).get_by_id(id)?)
    }

    pub fn list<T: Entity>(&self) -> ServiceResult<Vec<T>>
    where
        Self: Stores<T>,
    {
        Ok(<Self as Stores<T>>::repository(self).get_all()?)
    }

    /// Applies `patch` to record `id`, checking references the patch changes.
    pub fn update<T: Entity>(&self, id: EntityId, patch: &T::Patch) -> ServiceResult<T>
    where
        Self: Stores<T>,
    {
        <Self as Stores<T>>::repository(self).update_guarded(id, patch, |stored, merged| {
            let changed = changed_references(&stored.references(), &merged.references());
            check_all(|kind| self.lookup(kind), &changed)
        })
    }

    pub fn delete<T: Entity>(&self, id: EntityId) -> ServiceResult<()>
    where
        Self: Stores<T>,
    {
        Ok(<Self as Stores<T>>::repository(self).delete(id)?)
    }

    /// Runs report `R`; `parent_id == 0` reports every parent with children.
    pub fn report<R: Report>(&self, parent_id: EntityId) -> ServiceResult<Vec<R::Row>>
    where
        Self: Stores<R::Child> + Stores<R::Parent>,
    {
        run_report::<R>(
            <Self as Stores<R::Child>>::repository(self),
            <Self as Stores<R::Parent>>::repository(self),
            parent_id,
        )
    }
}
