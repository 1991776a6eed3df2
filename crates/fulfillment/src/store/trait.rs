use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use depot_core::{DocumentKind, TenantId};
use depot_inventory::{InventoryRecord, Item, ItemId, Location, LocationId, StockKey};
use depot_purchasing::{InboundShipment, PurchaseOrder, PurchaseOrderId, Putaway, PutawayId, ShipmentId};
use depot_sales::{Picking, PickingId, SalesOrder, SalesOrderId};

/// Store operation error.
///
/// These are infrastructure failures, as opposed to domain errors
/// (validation, invariants, transitions).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A row read by the transaction changed before commit.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tenant-scoped transactional warehouse store.
///
/// ## Semantics
///
/// - Every transaction is bound to one tenant; rows of other tenants are
///   invisible (lookups return `None`).
/// - Reads record the row version they observed; staged writes are visible to
///   later reads in the same transaction.
/// - `commit` re-validates every observed version and applies all staged
///   writes atomically, or fails with [`StoreError::Concurrency`] and applies
///   nothing.
/// - Dropping a transaction without committing discards it.
pub trait WarehouseStore: Send + Sync {
    type Tx: WarehouseTx;

    fn begin(&self, tenant_id: TenantId) -> StoreResult<Self::Tx>;
}

impl<S> WarehouseStore for Arc<S>
where
    S: WarehouseStore + ?Sized,
{
    type Tx = S::Tx;

    fn begin(&self, tenant_id: TenantId) -> StoreResult<Self::Tx> {
        (**self).begin(tenant_id)
    }
}

/// One unit of work against the store.
pub trait WarehouseTx {
    fn tenant_id(&self) -> TenantId;

    fn item(&mut self, id: ItemId) -> StoreResult<Option<Item>>;
    fn put_item(&mut self, item: Item) -> StoreResult<()>;

    fn location(&mut self, id: LocationId) -> StoreResult<Option<Location>>;
    fn locations(&mut self) -> StoreResult<Vec<Location>>;
    fn put_location(&mut self, location: Location) -> StoreResult<()>;

    fn inventory(&mut self, key: StockKey) -> StoreResult<Option<InventoryRecord>>;
    /// Every row of an item, at any location, any status.
    fn inventory_for_item(&mut self, item_id: ItemId) -> StoreResult<Vec<InventoryRecord>>;
    fn inventory_at(&mut self, location_id: LocationId) -> StoreResult<Vec<InventoryRecord>>;
    fn put_inventory(&mut self, record: InventoryRecord) -> StoreResult<()>;

    fn purchase_order(&mut self, id: PurchaseOrderId) -> StoreResult<Option<PurchaseOrder>>;
    fn put_purchase_order(&mut self, order: PurchaseOrder) -> StoreResult<()>;

    fn shipment(&mut self, id: ShipmentId) -> StoreResult<Option<InboundShipment>>;
    fn put_shipment(&mut self, shipment: InboundShipment) -> StoreResult<()>;

    fn putaway(&mut self, id: PutawayId) -> StoreResult<Option<Putaway>>;
    fn putaways_for_shipment(&mut self, shipment_id: ShipmentId) -> StoreResult<Vec<Putaway>>;
    fn put_putaway(&mut self, putaway: Putaway) -> StoreResult<()>;

    fn sales_order(&mut self, id: SalesOrderId) -> StoreResult<Option<SalesOrder>>;
    fn put_sales_order(&mut self, order: SalesOrder) -> StoreResult<()>;

    fn picking(&mut self, id: PickingId) -> StoreResult<Option<Picking>>;
    fn pickings_for_sales_order(&mut self, sales_order_id: SalesOrderId) -> StoreResult<Vec<Picking>>;
    fn put_picking(&mut self, picking: Picking) -> StoreResult<()>;

    /// Next document sequence for `(kind, date)`, starting at 1.
    ///
    /// The counter row is part of the transaction: two transactions that draw
    /// the same number cannot both commit.
    fn next_sequence(&mut self, kind: DocumentKind, date: NaiveDate) -> StoreResult<u32>;

    fn commit(self) -> StoreResult<()>
    where
        Self: Sized;
}
