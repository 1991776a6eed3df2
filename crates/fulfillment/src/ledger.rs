//! Inventory ledger operations.
//!
//! Every quantity change on a row is paired with the matching capacity change
//! on its location, staged in the same transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use depot_core::AggregateRoot;
use depot_inventory::{InventoryRecord, Item, Location, StockKey};

use crate::error::{FulfillmentError, FulfillmentResult};
use crate::store::WarehouseTx;

pub fn get<T: WarehouseTx>(tx: &mut T, key: StockKey) -> FulfillmentResult<Option<InventoryRecord>> {
    Ok(tx.inventory(key)?)
}

/// Create or merge stock at `location` (weighted-average cost).
///
/// No capacity precondition is checked here; callers decide whether the
/// destination must have room.
pub fn upsert_add<T: WarehouseTx>(
    tx: &mut T,
    item: &Item,
    location: &mut Location,
    quantity: i64,
    unit_cost: Decimal,
    provenance: Option<String>,
    at: DateTime<Utc>,
) -> FulfillmentResult<InventoryRecord> {
    let key = StockKey::new(item.id(), location.id());
    let record = match tx.inventory(key)? {
        Some(mut existing) => {
            existing
                .add(quantity, unit_cost, provenance, at)
                .map_err(|e| FulfillmentError::from_stock(e, item.sku(), location.code()))?;
            existing
        }
        None => InventoryRecord::open(tx.tenant_id(), key, quantity, unit_cost, provenance, at)
            .map_err(|e| FulfillmentError::from_stock(e, item.sku(), location.code()))?,
    };

    apply_capacity(location, quantity);
    tx.put_inventory(record.clone())?;
    tx.put_location(location.clone())?;
    Ok(record)
}

/// Remove stock from `location`; fails without staging anything when the row
/// holds less than `quantity`.
pub fn reduce<T: WarehouseTx>(
    tx: &mut T,
    item: &Item,
    location: &mut Location,
    quantity: i64,
    at: DateTime<Utc>,
) -> FulfillmentResult<InventoryRecord> {
    let key = StockKey::new(item.id(), location.id());
    let mut record = tx
        .inventory(key)?
        .ok_or_else(|| FulfillmentError::InsufficientStock {
            item: item.sku().to_string(),
            location: Some(location.code().to_string()),
            available: 0,
            requested: quantity,
        })?;

    record
        .reduce(quantity, at)
        .map_err(|e| FulfillmentError::from_stock(e, item.sku(), location.code()))?;

    apply_capacity(location, -quantity);
    tx.put_inventory(record.clone())?;
    tx.put_location(location.clone())?;
    Ok(record)
}

fn apply_capacity(location: &mut Location, delta: i64) {
    let change = location.apply(delta);
    if change.clamped {
        tracing::warn!(
            location = location.code(),
            delta,
            before = change.before,
            after = change.after,
            max_capacity = location.max_capacity(),
            "capacity clamped; stored capacity has drifted from the ledger"
        );
    }
}
