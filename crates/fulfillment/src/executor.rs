//! Movement executor: the only code path that changes stock.
//!
//! A move is checked in full before anything is staged, then staged as a
//! ledger reduce on the source and a ledger add on the destination. Nothing is
//! visible until the surrounding transaction commits.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use depot_core::AggregateRoot;
use depot_inventory::{InventoryRecord, Item, Location, LocationId, StockKey};

use crate::error::{FulfillmentError, FulfillmentResult};
use crate::ledger;
use crate::store::WarehouseTx;

/// Whether the destination must have free capacity for the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Stock goes to a newly chosen location; capacity is enforced.
    Allocate,
    /// Stock goes back where it came from; only the clamp applies.
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub source: InventoryRecord,
    pub destination: InventoryRecord,
}

/// Load a location or fail with `NotFound`.
pub fn load_location<T: WarehouseTx>(tx: &mut T, id: LocationId) -> FulfillmentResult<Location> {
    tx.location(id)?
        .ok_or_else(|| FulfillmentError::not_found(format!("location {id}")))
}

/// Move `quantity` of `item` from `from` to `to`.
///
/// The destination inherits the source row's average cost as cost basis.
/// `provenance` defaults to the source row's provenance.
#[allow(clippy::too_many_arguments)]
pub fn move_stock<T: WarehouseTx>(
    tx: &mut T,
    item: &Item,
    from: LocationId,
    to: LocationId,
    quantity: i64,
    kind: MoveKind,
    provenance: Option<String>,
    at: DateTime<Utc>,
) -> FulfillmentResult<MoveOutcome> {
    if quantity <= 0 {
        return Err(FulfillmentError::Validation(format!(
            "move of {}: quantity must be positive (got {quantity})",
            item.sku()
        )));
    }
    if from == to {
        return Err(FulfillmentError::Validation(format!(
            "move of {}: source and destination are the same location",
            item.sku()
        )));
    }

    let mut source_location = load_location(tx, from)?;
    let mut destination_location = load_location(tx, to)?;

    let source_row = tx.inventory(StockKey::new(item.id(), from))?;
    let available = source_row.as_ref().map(InventoryRecord::quantity).unwrap_or(0);
    if available < quantity {
        return Err(FulfillmentError::InsufficientStock {
            item: item.sku().to_string(),
            location: Some(source_location.code().to_string()),
            available,
            requested: quantity,
        });
    }
    if kind == MoveKind::Allocate {
        destination_location
            .ensure_can_accommodate(quantity)
            .map_err(|e| FulfillmentError::from_stock(e, item.sku(), destination_location.code()))?;
    }

    let (cost_basis, source_provenance) = source_row
        .map(|r| (r.average_cost(), r.provenance().map(str::to_string)))
        .unwrap_or((Decimal::ZERO, None));

    let source = ledger::reduce(tx, item, &mut source_location, quantity, at)?;
    let destination = ledger::upsert_add(
        tx,
        item,
        &mut destination_location,
        quantity,
        cost_basis,
        provenance.or(source_provenance),
        at,
    )?;

    tracing::debug!(
        item = item.sku(),
        from = source_location.code(),
        to = destination_location.code(),
        quantity,
        ?kind,
        "stock moved"
    );

    Ok(MoveOutcome { source, destination })
}

/// Inbound edge: stock enters the warehouse at a holding location.
pub fn receive<T: WarehouseTx>(
    tx: &mut T,
    item: &Item,
    holding: LocationId,
    quantity: i64,
    unit_cost: Decimal,
    provenance: Option<String>,
    at: DateTime<Utc>,
) -> FulfillmentResult<InventoryRecord> {
    item.ensure_active()?;
    let mut location = load_location(tx, holding)?;
    location
        .ensure_can_accommodate(quantity)
        .map_err(|e| FulfillmentError::from_stock(e, item.sku(), location.code()))?;

    let record = ledger::upsert_add(tx, item, &mut location, quantity, unit_cost, provenance, at)?;
    tracing::debug!(item = item.sku(), location = location.code(), quantity, "stock received");
    Ok(record)
}

/// Outbound edge: stock leaves the warehouse from a holding location.
pub fn dispatch<T: WarehouseTx>(
    tx: &mut T,
    item: &Item,
    holding: LocationId,
    quantity: i64,
    at: DateTime<Utc>,
) -> FulfillmentResult<InventoryRecord> {
    let mut location = load_location(tx, holding)?;
    let record = ledger::reduce(tx, item, &mut location, quantity, at)?;
    tracing::debug!(item = item.sku(), location = location.code(), quantity, "stock dispatched");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::TenantId;
    use depot_inventory::{ItemId, LocationCategory};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use crate::store::{InMemoryWarehouseStore, WarehouseStore};

    struct World {
        store: InMemoryWarehouseStore,
        tenant: TenantId,
        item: Item,
        rack: LocationId,
        dock: LocationId,
    }

    fn world(rack_max: i64, dock_max: i64, rack_stock: i64) -> World {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();
        let item = Item::new(tenant, ItemId::generate(), "SKU-1", "Widget", "ea").unwrap();
        let rack = Location::new(tenant, LocationId::generate(), "A-01", LocationCategory::Storage, rack_max).unwrap();
        let dock = Location::new(tenant, LocationId::generate(), "H-01", LocationCategory::Holding, dock_max).unwrap();
        let (rack_id, dock_id) = (rack.id(), dock.id());

        let mut tx = store.begin(tenant).unwrap();
        tx.put_item(item.clone()).unwrap();
        tx.put_location(rack).unwrap();
        tx.put_location(dock).unwrap();
        if rack_stock > 0 {
            let mut rack = tx.location(rack_id).unwrap().unwrap();
            ledger::upsert_add(&mut tx, &item, &mut rack, rack_stock, dec!(2.5), Some("ASN#L1".into()), Utc::now())
                .unwrap();
        }
        tx.commit().unwrap();

        World {
            store,
            tenant,
            item,
            rack: rack_id,
            dock: dock_id,
        }
    }

    #[test]
    fn move_carries_cost_and_provenance() {
        let w = world(100, 100, 40);
        let mut tx = w.store.begin(w.tenant).unwrap();

        let out = move_stock(&mut tx, &w.item, w.rack, w.dock, 15, MoveKind::Allocate, None, Utc::now()).unwrap();

        assert_eq!(out.source.quantity(), 25);
        assert_eq!(out.destination.quantity(), 15);
        assert_eq!(out.destination.average_cost(), dec!(2.5));
        assert_eq!(out.destination.provenance(), Some("ASN#L1"));
    }

    #[test]
    fn allocate_into_full_destination_fails_before_staging() {
        let w = world(100, 10, 40);
        let mut tx = w.store.begin(w.tenant).unwrap();

        let err = move_stock(&mut tx, &w.item, w.rack, w.dock, 15, MoveKind::Allocate, None, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            FulfillmentError::InsufficientCapacity {
                location: "H-01".into(),
                available: 10,
                requested: 15,
            }
        );
        let source = tx.inventory(StockKey::new(w.item.id(), w.rack)).unwrap().unwrap();
        assert_eq!(source.quantity(), 40);
    }

    #[test]
    fn return_move_skips_capacity_check() {
        let w = world(100, 10, 40);
        let mut tx = w.store.begin(w.tenant).unwrap();

        move_stock(&mut tx, &w.item, w.rack, w.dock, 15, MoveKind::Return, None, Utc::now()).unwrap();
        let dock = tx.location(w.dock).unwrap().unwrap();
        assert_eq!(dock.current_capacity(), 10, "clamped at max");
    }

    #[test]
    fn missing_source_stock_is_insufficient() {
        let w = world(100, 100, 0);
        let mut tx = w.store.begin(w.tenant).unwrap();
        let err = move_stock(&mut tx, &w.item, w.rack, w.dock, 1, MoveKind::Allocate, None, Utc::now()).unwrap_err();
        assert!(matches!(err, FulfillmentError::InsufficientStock { available: 0, requested: 1, .. }));
    }

    #[test]
    fn same_location_move_is_rejected() {
        let w = world(100, 100, 5);
        let mut tx = w.store.begin(w.tenant).unwrap();
        let err = move_stock(&mut tx, &w.item, w.rack, w.rack, 1, MoveKind::Allocate, None, Utc::now()).unwrap_err();
        assert!(matches!(err, FulfillmentError::Validation(_)));
    }

    #[test]
    fn receive_rejects_inactive_item() {
        let mut w = world(100, 100, 0);
        w.item.deactivate();
        let mut tx = w.store.begin(w.tenant).unwrap();
        let err = receive(&mut tx, &w.item, w.dock, 5, dec!(1), None, Utc::now()).unwrap_err();
        assert!(matches!(err, FulfillmentError::Validation(_)));
    }

    #[test]
    fn dispatch_empties_holding() {
        let w = world(100, 100, 0);
        let mut tx = w.store.begin(w.tenant).unwrap();
        receive(&mut tx, &w.item, w.dock, 5, dec!(1), None, Utc::now()).unwrap();
        let row = dispatch(&mut tx, &w.item, w.dock, 5, Utc::now()).unwrap();
        assert_eq!(row.quantity(), 0);
        assert_eq!(tx.location(w.dock).unwrap().unwrap().current_capacity(), 0);
    }

    proptest! {
        /// Property: a successful move shifts exactly `qty` between the two rows
        /// and leaves the combined used capacity unchanged.
        #[test]
        fn move_conserves_stock_and_capacity(stock in 1i64..200, qty in 1i64..250) {
            let w = world(500, 500, stock);
            let mut tx = w.store.begin(w.tenant).unwrap();
            let used_before = tx.location(w.rack).unwrap().unwrap().current_capacity()
                + tx.location(w.dock).unwrap().unwrap().current_capacity();

            match move_stock(&mut tx, &w.item, w.rack, w.dock, qty, MoveKind::Allocate, None, Utc::now()) {
                Ok(out) => {
                    prop_assert!(qty <= stock);
                    prop_assert_eq!(out.source.quantity(), stock - qty);
                    prop_assert_eq!(out.destination.quantity(), qty);
                    let used_after = tx.location(w.rack).unwrap().unwrap().current_capacity()
                        + tx.location(w.dock).unwrap().unwrap().current_capacity();
                    prop_assert_eq!(used_before, used_after);
                }
                Err(err) => {
                    prop_assert!(qty > stock);
                    let is_stock_error = matches!(err, FulfillmentError::InsufficientStock { .. });
                    prop_assert!(is_stock_error);
                }
            }
        }
    }
}
