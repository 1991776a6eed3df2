//! Fulfillment orchestrator: the public workflows.
//!
//! Each workflow runs as one store transaction:
//!
//! ```text
//! begin(tenant)
//!   ↓
//! load documents + master data (versions recorded)
//!   ↓
//! planner (read-only selection)
//!   ↓
//! executor (stock + capacity, staged)
//!   ↓
//! document status recompute (staged)
//!   ↓
//! commit (version check) ── conflict ──▶ retry within budget
//! ```
//!
//! Any error before commit drops the transaction, so nothing partial is
//! ever visible.

mod capacity;
mod inbound;
mod master;
mod outbound;

use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use depot_core::{DocumentKind, DocumentNumber, TenantId};
use depot_inventory::{InventoryRecord, Item, ItemId, Location, LocationId, StockKey};
use depot_purchasing::{InboundShipment, PurchaseOrder, PurchaseOrderId, Putaway, PutawayId, ShipmentId};
use depot_sales::{Picking, PickingId, SalesOrder, SalesOrderId};

use crate::config::FulfillmentConfig;
use crate::error::{FulfillmentError, FulfillmentResult};
use crate::store::{WarehouseStore, WarehouseTx};

/// Line input for purchase orders, shipment notices and sales orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl LineInput {
    pub fn new(item_id: ItemId, quantity: i64, unit_price: Decimal) -> Self {
        Self {
            item_id,
            quantity,
            unit_price,
        }
    }
}

/// Identity of a newly created document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef<I> {
    pub id: I,
    pub number: DocumentNumber,
}

/// Entry point for every warehouse workflow.
#[derive(Debug)]
pub struct FulfillmentEngine<S> {
    store: S,
    config: FulfillmentConfig,
}

impl<S> FulfillmentEngine<S> {
    pub fn new(store: S, config: FulfillmentConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &FulfillmentConfig {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: WarehouseStore> FulfillmentEngine<S> {
    /// Run `work` in a transaction, retrying on concurrency conflicts while
    /// attempts and time remain.
    fn run<R>(
        &self,
        operation: &'static str,
        tenant_id: TenantId,
        mut work: impl FnMut(&mut S::Tx) -> FulfillmentResult<R>,
    ) -> FulfillmentResult<R> {
        let deadline = Instant::now() + self.config.operation_timeout;
        let mut attempt = 1;
        loop {
            match self.attempt(tenant_id, &mut work) {
                Err(err) if err.is_retryable() => {
                    if attempt >= self.config.max_attempts || Instant::now() >= deadline {
                        tracing::warn!(operation, attempt, error = %err, "giving up after concurrency conflict");
                        return Err(err);
                    }
                    tracing::warn!(operation, attempt, error = %err, "concurrency conflict, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn attempt<R>(
        &self,
        tenant_id: TenantId,
        work: &mut impl FnMut(&mut S::Tx) -> FulfillmentResult<R>,
    ) -> FulfillmentResult<R> {
        let mut tx = self.store.begin(tenant_id)?;
        let value = work(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Read-only access; the transaction is never committed.
    fn read<R>(&self, tenant_id: TenantId, work: impl FnOnce(&mut S::Tx) -> FulfillmentResult<R>) -> FulfillmentResult<R> {
        let mut tx = self.store.begin(tenant_id)?;
        work(&mut tx)
    }

    pub fn item(&self, tenant_id: TenantId, id: ItemId) -> FulfillmentResult<Item> {
        self.read(tenant_id, |tx| load_item(tx, id))
    }

    pub fn location(&self, tenant_id: TenantId, id: LocationId) -> FulfillmentResult<Location> {
        self.read(tenant_id, |tx| crate::executor::load_location(tx, id))
    }

    pub fn inventory(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
        location_id: LocationId,
    ) -> FulfillmentResult<Option<InventoryRecord>> {
        self.read(tenant_id, |tx| crate::ledger::get(tx, StockKey::new(item_id, location_id)))
    }

    pub fn purchase_order(&self, tenant_id: TenantId, id: PurchaseOrderId) -> FulfillmentResult<PurchaseOrder> {
        self.read(tenant_id, |tx| load_purchase_order(tx, id))
    }

    pub fn shipment(&self, tenant_id: TenantId, id: ShipmentId) -> FulfillmentResult<InboundShipment> {
        self.read(tenant_id, |tx| load_shipment(tx, id))
    }

    pub fn putaway(&self, tenant_id: TenantId, id: PutawayId) -> FulfillmentResult<Putaway> {
        self.read(tenant_id, |tx| load_putaway(tx, id))
    }

    pub fn sales_order(&self, tenant_id: TenantId, id: SalesOrderId) -> FulfillmentResult<SalesOrder> {
        self.read(tenant_id, |tx| load_sales_order(tx, id))
    }

    pub fn picking(&self, tenant_id: TenantId, id: PickingId) -> FulfillmentResult<Picking> {
        self.read(tenant_id, |tx| load_picking(tx, id))
    }
}

fn today(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

fn next_number<T: WarehouseTx>(tx: &mut T, kind: DocumentKind, at: DateTime<Utc>) -> FulfillmentResult<DocumentNumber> {
    let date = today(at);
    let sequence = tx.next_sequence(kind, date)?;
    Ok(DocumentNumber::new(kind, date, sequence))
}

fn load_item<T: WarehouseTx>(tx: &mut T, id: ItemId) -> FulfillmentResult<Item> {
    tx.item(id)?
        .ok_or_else(|| FulfillmentError::not_found(format!("item {id}")))
}

fn load_active_item<T: WarehouseTx>(tx: &mut T, id: ItemId) -> FulfillmentResult<Item> {
    let item = load_item(tx, id)?;
    item.ensure_active()?;
    Ok(item)
}

fn load_purchase_order<T: WarehouseTx>(tx: &mut T, id: PurchaseOrderId) -> FulfillmentResult<PurchaseOrder> {
    tx.purchase_order(id)?
        .ok_or_else(|| FulfillmentError::not_found(format!("purchase order {id}")))
}

fn load_shipment<T: WarehouseTx>(tx: &mut T, id: ShipmentId) -> FulfillmentResult<InboundShipment> {
    tx.shipment(id)?
        .ok_or_else(|| FulfillmentError::not_found(format!("shipment notice {id}")))
}

fn load_putaway<T: WarehouseTx>(tx: &mut T, id: PutawayId) -> FulfillmentResult<Putaway> {
    tx.putaway(id)?
        .ok_or_else(|| FulfillmentError::not_found(format!("putaway {id}")))
}

fn load_sales_order<T: WarehouseTx>(tx: &mut T, id: SalesOrderId) -> FulfillmentResult<SalesOrder> {
    tx.sales_order(id)?
        .ok_or_else(|| FulfillmentError::not_found(format!("sales order {id}")))
}

fn load_picking<T: WarehouseTx>(tx: &mut T, id: PickingId) -> FulfillmentResult<Picking> {
    tx.picking(id)?
        .ok_or_else(|| FulfillmentError::not_found(format!("picking {id}")))
}
