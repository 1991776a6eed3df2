//! Inbound workflows: purchase orders, shipment notices, receiving and putaway.

use chrono::Utc;
use tracing::{info, instrument};

use depot_core::{AggregateRoot, DocumentKind, TenantId, UserId};
use depot_inventory::{LocationCategory, LocationId};
use depot_purchasing::{
    InboundShipment, PurchaseOrder, PurchaseOrderId, PurchaseOrderStatus, Putaway, PutawayId, PutawayLine,
    PutawayRequest, PutawayStatus, ShipmentId, ShipmentStatus, SupplierId,
};

use super::{
    load_active_item, load_item, load_purchase_order, load_putaway, load_shipment, next_number, DocumentRef,
    FulfillmentEngine, LineInput,
};
use crate::error::{FulfillmentError, FulfillmentResult};
use crate::executor::{self, MoveKind};
use crate::planner;
use crate::store::{WarehouseStore, WarehouseTx};

impl<S: WarehouseStore> FulfillmentEngine<S> {
    #[instrument(skip(self, lines))]
    pub fn create_purchase_order(
        &self,
        tenant_id: TenantId,
        user: UserId,
        supplier_id: SupplierId,
        lines: &[LineInput],
    ) -> FulfillmentResult<DocumentRef<PurchaseOrderId>> {
        self.run("create_purchase_order", tenant_id, |tx| {
            let now = Utc::now();
            let number = next_number(tx, DocumentKind::PurchaseOrder, now)?;
            let mut order = PurchaseOrder::new(tenant_id, PurchaseOrderId::generate(), number, supplier_id, user, now);
            for line in lines {
                load_active_item(tx, line.item_id)?;
                order.add_line(line.item_id, line.quantity, line.unit_price)?;
            }
            let created = DocumentRef {
                id: order.id(),
                number,
            };
            tx.put_purchase_order(order)?;
            Ok(created)
        })
    }

    #[instrument(skip(self))]
    pub fn send_purchase_order(&self, tenant_id: TenantId, id: PurchaseOrderId) -> FulfillmentResult<PurchaseOrder> {
        self.run("send_purchase_order", tenant_id, |tx| {
            let mut order = load_purchase_order(tx, id)?;
            order.send(Utc::now())?;
            tx.put_purchase_order(order.clone())?;
            Ok(order)
        })
    }

    #[instrument(skip(self))]
    pub fn cancel_purchase_order(&self, tenant_id: TenantId, id: PurchaseOrderId) -> FulfillmentResult<PurchaseOrder> {
        self.run("cancel_purchase_order", tenant_id, |tx| {
            let mut order = load_purchase_order(tx, id)?;
            order.cancel(Utc::now())?;
            tx.put_purchase_order(order.clone())?;
            Ok(order)
        })
    }

    /// Announce goods against a sent purchase order. Every line's item must be
    /// on the order; fees come from the configured schedule.
    #[instrument(skip(self, lines))]
    pub fn create_shipment_notice(
        &self,
        tenant_id: TenantId,
        user: UserId,
        purchase_order_id: PurchaseOrderId,
        holding_location_id: LocationId,
        lines: &[LineInput],
    ) -> FulfillmentResult<DocumentRef<ShipmentId>> {
        let fees = &self.config.fees;
        self.run("create_shipment_notice", tenant_id, |tx| {
            let order = load_purchase_order(tx, purchase_order_id)?;
            if order.status() != PurchaseOrderStatus::Sent {
                return Err(FulfillmentError::state_conflict(format!(
                    "purchase order {} is {:?}; shipment notices need a sent order",
                    order.number(),
                    order.status()
                )));
            }
            let holding = executor::load_location(tx, holding_location_id)?;
            if holding.category() != LocationCategory::Holding {
                return Err(FulfillmentError::Validation(format!(
                    "location {} is not a holding location",
                    holding.code()
                )));
            }

            let now = Utc::now();
            let number = next_number(tx, DocumentKind::ShipmentNotice, now)?;
            let mut shipment = InboundShipment::new(
                tenant_id,
                ShipmentId::generate(),
                number,
                purchase_order_id,
                holding_location_id,
                user,
                now,
            );
            for line in lines {
                let item = load_active_item(tx, line.item_id)?;
                if order.line_for_item(line.item_id).is_none() {
                    return Err(FulfillmentError::Validation(format!(
                        "item {} is not on purchase order {}",
                        item.sku(),
                        order.number()
                    )));
                }
                shipment.add_line(line.item_id, line.quantity, line.unit_price, fees)?;
            }

            let created = DocumentRef {
                id: shipment.id(),
                number,
            };
            tx.put_shipment(shipment)?;
            Ok(created)
        })
    }

    #[instrument(skip(self))]
    pub fn mark_shipment_in_transit(&self, tenant_id: TenantId, id: ShipmentId) -> FulfillmentResult<InboundShipment> {
        self.run("mark_shipment_in_transit", tenant_id, |tx| {
            let mut shipment = load_shipment(tx, id)?;
            shipment.mark_in_transit(Utc::now())?;
            tx.put_shipment(shipment.clone())?;
            Ok(shipment)
        })
    }

    #[instrument(skip(self))]
    pub fn mark_shipment_arrived(&self, tenant_id: TenantId, id: ShipmentId) -> FulfillmentResult<InboundShipment> {
        self.run("mark_shipment_arrived", tenant_id, |tx| {
            let mut shipment = load_shipment(tx, id)?;
            shipment.mark_arrived(Utc::now())?;
            tx.put_shipment(shipment.clone())?;
            Ok(shipment)
        })
    }

    /// Post every line into the holding location; ASN → Processed and the
    /// purchase order → Received.
    #[instrument(skip(self))]
    pub fn receive_shipment(&self, tenant_id: TenantId, id: ShipmentId) -> FulfillmentResult<InboundShipment> {
        self.run("receive_shipment", tenant_id, |tx| {
            let now = Utc::now();
            let mut shipment = load_shipment(tx, id)?;
            if shipment.status() != ShipmentStatus::Arrived {
                return Err(FulfillmentError::state_conflict(format!(
                    "shipment notice {} is {:?}; only arrived shipments can be received",
                    shipment.number(),
                    shipment.status()
                )));
            }

            for line in shipment.lines() {
                let item = load_active_item(tx, line.item_id())?;
                executor::receive(
                    tx,
                    &item,
                    shipment.holding_location_id(),
                    line.shipped_quantity(),
                    line.unit_price(),
                    Some(shipment.provenance(line.line_no())),
                    now,
                )?;
            }
            shipment.mark_processed(now)?;

            let mut order = load_purchase_order(tx, shipment.purchase_order_id())?;
            if order.status() == PurchaseOrderStatus::Sent {
                order.mark_received(now)?;
                tx.put_purchase_order(order)?;
            }

            tx.put_shipment(shipment.clone())?;
            info!(shipment = %shipment.number(), lines = shipment.lines().len(), "shipment received");
            Ok(shipment)
        })
    }

    /// Plan a destination for every line with stock still in holding.
    #[instrument(skip(self, notes))]
    pub fn create_putaway(
        &self,
        tenant_id: TenantId,
        user: UserId,
        shipment_id: ShipmentId,
        notes: Option<String>,
    ) -> FulfillmentResult<DocumentRef<PutawayId>> {
        self.run("create_putaway", tenant_id, |tx| {
            let shipment = load_shipment(tx, shipment_id)?;
            if !matches!(shipment.status(), ShipmentStatus::Processed | ShipmentStatus::PutAway) {
                return Err(FulfillmentError::state_conflict(format!(
                    "shipment notice {} is {:?}; putaway needs received goods",
                    shipment.number(),
                    shipment.status()
                )));
            }
            if let Some(active) = tx.putaways_for_shipment(shipment_id)?.iter().find(|p| p.is_active()) {
                return Err(FulfillmentError::state_conflict(format!(
                    "shipment notice {} already has putaway {}",
                    shipment.number(),
                    active.number()
                )));
            }

            let mut slots = planner::storage_slots(tx)?;
            let mut lines = Vec::new();
            for line in shipment.lines().iter().filter(|l| l.remaining_quantity() > 0) {
                let item = load_active_item(tx, line.item_id())?;
                let quantity = line.remaining_quantity();
                let idx = planner::choose_destination(&slots, item.id(), quantity).ok_or_else(|| {
                    FulfillmentError::InsufficientCapacity {
                        location: format!("any storage location for {}", item.sku()),
                        available: slots.iter().map(|s| s.available).max().unwrap_or(0),
                        requested: quantity,
                    }
                })?;
                slots[idx].reserve(item.id(), quantity);
                lines.push(PutawayLine::planned(
                    lines.len() as u32 + 1,
                    line.line_no(),
                    item.id(),
                    slots[idx].location_id,
                    quantity,
                )?);
            }

            let now = Utc::now();
            let number = next_number(tx, DocumentKind::Putaway, now)?;
            let putaway = Putaway::new(
                tenant_id,
                PutawayId::generate(),
                number,
                shipment_id,
                lines,
                notes.clone(),
                user,
                now,
            )?;
            let created = DocumentRef {
                id: putaway.id(),
                number,
            };
            tx.put_putaway(putaway)?;
            // Bumps the shipment row so a concurrent create_putaway conflicts.
            tx.put_shipment(shipment)?;
            info!(putaway = %number, "putaway created");
            Ok(created)
        })
    }

    /// Move stock from the ASN holding location into the planned storage
    /// locations. The whole batch commits or nothing does.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn process_putaway(
        &self,
        tenant_id: TenantId,
        putaway_id: PutawayId,
        entries: &[PutawayRequest],
    ) -> FulfillmentResult<Putaway> {
        self.run("process_putaway", tenant_id, |tx| {
            let now = Utc::now();
            let mut putaway = load_putaway(tx, putaway_id)?;
            let mut shipment = load_shipment(tx, putaway.shipment_id())?;

            for entry in entries {
                let line = putaway.check_store(entry)?;
                let (item_id, shipment_line) = (line.item_id(), line.shipment_line());
                let item = load_item(tx, item_id)?;
                executor::move_stock(
                    tx,
                    &item,
                    shipment.holding_location_id(),
                    entry.destination_location_id,
                    entry.quantity,
                    MoveKind::Allocate,
                    Some(shipment.provenance(shipment_line)),
                    now,
                )?;
                putaway.record_store(entry, now)?;
                shipment.record_putaway(shipment_line, entry.quantity, now)?;
            }

            let status = putaway.recompute_status(now)?;
            tx.put_putaway(putaway.clone())?;
            tx.put_shipment(shipment.clone())?;
            if status == PutawayStatus::Completed {
                info!(putaway = %putaway.number(), shipment = %shipment.number(), status = ?shipment.status(), "putaway completed");
            }
            Ok(putaway)
        })
    }
}
