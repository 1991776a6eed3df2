//! Outbound workflows: sales orders, picking, shipping and cancellation.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use depot_core::{AggregateRoot, DocumentKind, TenantId, UserId};
use depot_inventory::{ItemId, LocationCategory, LocationId};
use depot_sales::{
    CustomerId, PickRequest, Picking, PickingId, PickingLine, PickingStatus, SalesOrder, SalesOrderId,
    SalesOrderStatus,
};

use super::{
    load_active_item, load_item, load_picking, load_sales_order, next_number, DocumentRef, FulfillmentEngine,
    LineInput,
};
use crate::error::{FulfillmentError, FulfillmentResult};
use crate::executor::{self, MoveKind};
use crate::planner::{self, AvailableLocation, PickPool};
use crate::store::{WarehouseStore, WarehouseTx};

impl<S: WarehouseStore> FulfillmentEngine<S> {
    #[instrument(skip(self, lines))]
    pub fn create_sales_order(
        &self,
        tenant_id: TenantId,
        user: UserId,
        customer_id: CustomerId,
        lines: &[LineInput],
    ) -> FulfillmentResult<DocumentRef<SalesOrderId>> {
        self.run("create_sales_order", tenant_id, |tx| {
            let now = Utc::now();
            let number = next_number(tx, DocumentKind::SalesOrder, now)?;
            let mut order = SalesOrder::new(tenant_id, SalesOrderId::generate(), number, customer_id, user, now);
            for line in lines {
                load_active_item(tx, line.item_id)?;
                order.add_line(line.item_id, line.quantity, line.unit_price)?;
            }
            let created = DocumentRef {
                id: order.id(),
                number,
            };
            tx.put_sales_order(order)?;
            Ok(created)
        })
    }

    #[instrument(skip(self))]
    pub fn assign_holding_location(
        &self,
        tenant_id: TenantId,
        sales_order_id: SalesOrderId,
        location_id: LocationId,
    ) -> FulfillmentResult<SalesOrder> {
        self.run("assign_holding_location", tenant_id, |tx| {
            let location = executor::load_location(tx, location_id)?;
            if location.category() != LocationCategory::Holding {
                return Err(FulfillmentError::Validation(format!(
                    "location {} is not a holding location",
                    location.code()
                )));
            }
            let mut order = load_sales_order(tx, sales_order_id)?;
            order.assign_holding_location(location_id, Utc::now())?;
            tx.put_sales_order(order.clone())?;
            Ok(order)
        })
    }

    /// Plan a picking for every sales order line (FIFO across storage).
    #[instrument(skip(self, notes))]
    pub fn create_picking(
        &self,
        tenant_id: TenantId,
        user: UserId,
        sales_order_id: SalesOrderId,
        notes: Option<String>,
    ) -> FulfillmentResult<DocumentRef<PickingId>> {
        self.run("create_picking", tenant_id, |tx| {
            let now = Utc::now();
            let mut order = load_sales_order(tx, sales_order_id)?;
            if !order.is_pickable() {
                return Err(FulfillmentError::state_conflict(format!(
                    "sales order {} is {:?}; picking needs a pending or in-progress order",
                    order.number(),
                    order.status()
                )));
            }
            if let Some(active) = active_picking(tx, sales_order_id)? {
                return Err(FulfillmentError::state_conflict(format!(
                    "sales order {} already has active picking {}",
                    order.number(),
                    active.number()
                )));
            }
            order.require_holding_location()?;
            if order.lines().is_empty() {
                return Err(FulfillmentError::Validation(format!(
                    "sales order {} has no lines",
                    order.number()
                )));
            }

            // One pool per item, shared by all of its lines.
            let mut pools: HashMap<ItemId, PickPool> = HashMap::new();
            let mut lines = Vec::new();
            for so_line in order.lines() {
                let item = load_active_item(tx, so_line.item_id)?;
                let pool = match pools.entry(item.id()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(PickPool::load(tx, item.id())?),
                };
                let plan = planner::plan_pick(pool, item.sku(), so_line.quantity)?;
                for allocation in plan.allocations {
                    lines.push(PickingLine::planned(
                        lines.len() as u32 + 1,
                        so_line.line_no,
                        item.id(),
                        allocation.location_id,
                        allocation.quantity,
                    )?);
                }
            }

            let number = next_number(tx, DocumentKind::Picking, now)?;
            let picking = Picking::new(
                tenant_id,
                PickingId::generate(),
                number,
                sales_order_id,
                lines,
                notes.clone(),
                user,
                now,
            )?;
            order.start_picking(now)?;

            let created = DocumentRef {
                id: picking.id(),
                number,
            };
            tx.put_picking(picking)?;
            tx.put_sales_order(order)?;
            info!(picking = %number, "picking created");
            Ok(created)
        })
    }

    /// Pick a batch of lines into the sales order's holding location.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn process_picking(
        &self,
        tenant_id: TenantId,
        picking_id: PickingId,
        entries: &[PickRequest],
    ) -> FulfillmentResult<Picking> {
        self.run("process_picking", tenant_id, |tx| {
            let now = Utc::now();
            let mut picking = load_picking(tx, picking_id)?;
            let mut order = load_sales_order(tx, picking.sales_order_id())?;
            if order.status() == SalesOrderStatus::Cancelled {
                return Err(FulfillmentError::state_conflict(format!(
                    "sales order {} is cancelled",
                    order.number()
                )));
            }
            picking.ensure_processable()?;
            let holding = order.require_holding_location()?;

            for entry in entries {
                let item_id = picking.check_pick(entry)?.item_id();
                let item = load_item(tx, item_id)?;
                executor::move_stock(
                    tx,
                    &item,
                    entry.source_location_id,
                    holding,
                    entry.quantity,
                    MoveKind::Allocate,
                    None,
                    now,
                )?;
                picking.record_pick(entry, now)?;
            }

            if picking.recompute_status(now)? == PickingStatus::Completed {
                order.mark_picked(now)?;
                info!(picking = %picking.number(), sales_order = %order.number(), "picking completed");
            }
            tx.put_picking(picking.clone())?;
            tx.put_sales_order(order)?;
            Ok(picking)
        })
    }

    /// Return picked stock to its source locations; the order goes back to Pending.
    #[instrument(skip(self))]
    pub fn cancel_picking(&self, tenant_id: TenantId, picking_id: PickingId) -> FulfillmentResult<Picking> {
        self.run("cancel_picking", tenant_id, |tx| {
            let now = Utc::now();
            let mut picking = load_picking(tx, picking_id)?;
            let mut order = load_sales_order(tx, picking.sales_order_id())?;

            revert_picking(tx, &order, &mut picking, now)?;
            if order.status() == SalesOrderStatus::InProgress {
                order.reopen(now)?;
            }
            tx.put_picking(picking.clone())?;
            tx.put_sales_order(order)?;
            Ok(picking)
        })
    }

    /// Cancel a pending or in-progress order, reverting its active picking.
    #[instrument(skip(self))]
    pub fn cancel_sales_order(&self, tenant_id: TenantId, sales_order_id: SalesOrderId) -> FulfillmentResult<SalesOrder> {
        self.run("cancel_sales_order", tenant_id, |tx| {
            let now = Utc::now();
            let mut order = load_sales_order(tx, sales_order_id)?;
            if !order.is_pickable() {
                return Err(FulfillmentError::state_conflict(format!(
                    "sales order {} is {:?} and can no longer be cancelled",
                    order.number(),
                    order.status()
                )));
            }
            if let Some(mut picking) = active_picking(tx, sales_order_id)? {
                revert_picking(tx, &order, &mut picking, now)?;
                tx.put_picking(picking)?;
            }
            order.cancel(now)?;
            tx.put_sales_order(order.clone())?;
            Ok(order)
        })
    }

    /// Dispatch the picked goods out of holding; SO → Shipped.
    #[instrument(skip(self))]
    pub fn ship_sales_order(&self, tenant_id: TenantId, sales_order_id: SalesOrderId) -> FulfillmentResult<SalesOrder> {
        self.run("ship_sales_order", tenant_id, |tx| {
            let now = Utc::now();
            let mut order = load_sales_order(tx, sales_order_id)?;
            if order.status() != SalesOrderStatus::Picked {
                return Err(FulfillmentError::state_conflict(format!(
                    "sales order {} is {:?}; only picked orders can ship",
                    order.number(),
                    order.status()
                )));
            }
            let holding = order.require_holding_location()?;
            let picking = tx
                .pickings_for_sales_order(sales_order_id)?
                .into_iter()
                .find(|p| p.status() == PickingStatus::Completed)
                .ok_or_else(|| {
                    FulfillmentError::state_conflict(format!("sales order {} has no completed picking", order.number()))
                })?;

            let mut picked: BTreeMap<ItemId, i64> = BTreeMap::new();
            for line in picking.lines() {
                *picked.entry(line.item_id()).or_insert(0) += line.quantity_picked();
            }
            for (item_id, quantity) in picked {
                let item = load_item(tx, item_id)?;
                executor::dispatch(tx, &item, holding, quantity, now)?;
            }

            order.ship(now)?;
            tx.put_sales_order(order.clone())?;
            info!(sales_order = %order.number(), "sales order shipped");
            Ok(order)
        })
    }

    /// Storage locations with at least `min_quantity` (default 1) pickable units.
    pub fn get_available_locations(
        &self,
        tenant_id: TenantId,
        item_id: ItemId,
        min_quantity: Option<i64>,
    ) -> FulfillmentResult<Vec<AvailableLocation>> {
        let min_quantity = min_quantity.unwrap_or(1).max(1);
        self.read(tenant_id, |tx| {
            load_item(tx, item_id)?;
            planner::available_locations(tx, item_id, min_quantity)
        })
    }

    /// The active picking of an order, else its most recent one.
    pub fn get_picking_by_sales_order(
        &self,
        tenant_id: TenantId,
        sales_order_id: SalesOrderId,
    ) -> FulfillmentResult<Option<Picking>> {
        self.read(tenant_id, |tx| {
            load_sales_order(tx, sales_order_id)?;
            let mut pickings = tx.pickings_for_sales_order(sales_order_id)?;
            pickings.sort_by_key(|p| p.created_at());
            let active = pickings.iter().rposition(Picking::is_active);
            Ok(match active {
                Some(idx) => Some(pickings.swap_remove(idx)),
                None => pickings.pop(),
            })
        })
    }
}

fn active_picking<T: WarehouseTx>(tx: &mut T, sales_order_id: SalesOrderId) -> FulfillmentResult<Option<Picking>> {
    Ok(tx
        .pickings_for_sales_order(sales_order_id)?
        .into_iter()
        .find(Picking::is_active))
}

/// Move every picked unit back to its line's source and cancel the picking.
fn revert_picking<T: WarehouseTx>(
    tx: &mut T,
    order: &SalesOrder,
    picking: &mut Picking,
    at: DateTime<Utc>,
) -> FulfillmentResult<()> {
    // Rejects Completed/Cancelled before any stock moves.
    picking.cancel(at)?;
    let holding = order.require_holding_location()?;
    for line in picking.lines().iter().filter(|l| l.quantity_picked() > 0) {
        let item = load_item(tx, line.item_id())?;
        executor::move_stock(
            tx,
            &item,
            holding,
            line.source_location_id(),
            line.quantity_picked(),
            MoveKind::Return,
            None,
            at,
        )?;
    }
    info!(picking = %picking.number(), "picking cancelled");
    Ok(())
}
