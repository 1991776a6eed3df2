//! Allocation planner: which storage locations to pick from (FIFO) and which
//! storage location to put received goods into.
//!
//! The selection functions are pure; the `*_candidates` helpers gather their
//! input from a transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::AggregateRoot;
use depot_inventory::{ItemId, Location, LocationId};

use crate::error::{FulfillmentError, FulfillmentResult};
use crate::store::WarehouseTx;

/// Pickable stock at one storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCandidate {
    pub location_id: LocationId,
    pub location_code: String,
    pub quantity: i64,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub location_id: LocationId,
    pub location_code: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickPlan {
    pub required: i64,
    pub allocations: Vec<Allocation>,
    pub shortfall: i64,
}

impl PickPlan {
    pub fn allocated(&self) -> i64 {
        self.required - self.shortfall
    }

    pub fn is_complete(&self) -> bool {
        self.shortfall == 0
    }
}

/// Oldest stock first; equal arrival times fall back to location code.
pub fn fifo_order(candidates: &mut [StockCandidate]) {
    candidates.sort_by(|a, b| {
        a.received_at
            .cmp(&b.received_at)
            .then_with(|| a.location_code.cmp(&b.location_code))
    });
}

/// Greedy FIFO allocation over `candidates`, which must already be in FIFO order.
pub fn allocate_fifo(candidates: &[StockCandidate], required: i64) -> PickPlan {
    let mut remaining = required.max(0);
    let mut allocations = Vec::new();

    for candidate in candidates {
        if remaining == 0 {
            break;
        }
        if candidate.quantity <= 0 {
            continue;
        }
        let take = remaining.min(candidate.quantity);
        allocations.push(Allocation {
            location_id: candidate.location_id,
            location_code: candidate.location_code.clone(),
            quantity: take,
        });
        remaining -= take;
    }

    PickPlan {
        required,
        allocations,
        shortfall: remaining,
    }
}

/// Pickable rows of `item_id`: Storage locations, `Available`, quantity > 0,
/// in FIFO order.
pub fn pick_candidates<T: WarehouseTx>(tx: &mut T, item_id: ItemId) -> FulfillmentResult<Vec<StockCandidate>> {
    let mut candidates = Vec::new();
    for record in tx.inventory_for_item(item_id)? {
        if !record.is_pickable() {
            continue;
        }
        let Some(location) = tx.location(record.location_id())? else {
            continue;
        };
        if !location.is_storage() {
            continue;
        }
        candidates.push(StockCandidate {
            location_id: location.id(),
            location_code: location.code().to_string(),
            quantity: record.quantity(),
            received_at: record.created_at(),
        });
    }
    fifo_order(&mut candidates);
    Ok(candidates)
}

/// Pickable stock of one item shared by every line planned against it.
///
/// Each plan takes its units out of the pool, so a later line for the same
/// item only sees what earlier lines left.
#[derive(Debug, Clone)]
pub struct PickPool {
    candidates: Vec<StockCandidate>,
    total: i64,
    taken: i64,
}

impl PickPool {
    /// `candidates` are put in FIFO order.
    pub fn new(mut candidates: Vec<StockCandidate>) -> Self {
        fifo_order(&mut candidates);
        let total = candidates.iter().map(|c| c.quantity.max(0)).sum();
        Self {
            candidates,
            total,
            taken: 0,
        }
    }

    pub fn load<T: WarehouseTx>(tx: &mut T, item_id: ItemId) -> FulfillmentResult<Self> {
        Ok(Self::new(pick_candidates(tx, item_id)?))
    }

    /// Units not yet planned.
    pub fn remaining(&self) -> i64 {
        self.total - self.taken
    }

    fn take(&mut self, plan: &PickPlan) {
        for allocation in &plan.allocations {
            if let Some(c) = self
                .candidates
                .iter_mut()
                .find(|c| c.location_id == allocation.location_id)
            {
                c.quantity -= allocation.quantity;
            }
            self.taken += allocation.quantity;
        }
    }
}

/// Plan a pick out of `pool`. A shortfall becomes `InsufficientStock` naming
/// the item with its pool-wide totals, and leaves the pool untouched.
pub fn plan_pick(pool: &mut PickPool, item_code: &str, required: i64) -> FulfillmentResult<PickPlan> {
    let plan = allocate_fifo(&pool.candidates, required);
    if !plan.is_complete() {
        return Err(FulfillmentError::InsufficientStock {
            item: item_code.to_string(),
            location: None,
            available: pool.total,
            requested: pool.taken + required,
        });
    }
    pool.take(&plan);
    Ok(plan)
}

/// A storage location as a putaway destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSlot {
    pub location_id: LocationId,
    pub code: String,
    pub available: i64,
    /// Quantity per item already at the location.
    pub stock: HashMap<ItemId, i64>,
}

impl StorageSlot {
    fn holding(&self, item_id: ItemId) -> i64 {
        self.stock.get(&item_id).copied().unwrap_or(0)
    }

    /// Account for a planned putaway so later choices see the reduced space.
    pub fn reserve(&mut self, item_id: ItemId, quantity: i64) {
        self.available -= quantity;
        *self.stock.entry(item_id).or_insert(0) += quantity;
    }
}

/// Index of the slot to put `quantity` of `item_id` into.
///
/// Only slots with room for the whole quantity qualify. Slots already holding
/// the item win (most of it first); otherwise the slot with the most free
/// space. Ties go to the lower location code.
pub fn choose_destination(slots: &[StorageSlot], item_id: ItemId, quantity: i64) -> Option<usize> {
    let fits = slots
        .iter()
        .enumerate()
        .filter(|(_, s)| s.available >= quantity);

    let same_item = fits
        .clone()
        .filter(|(_, s)| s.holding(item_id) > 0)
        .min_by(|(_, a), (_, b)| {
            b.holding(item_id)
                .cmp(&a.holding(item_id))
                .then_with(|| a.code.cmp(&b.code))
        });
    if let Some((idx, _)) = same_item {
        return Some(idx);
    }

    fits.min_by(|(_, a), (_, b)| b.available.cmp(&a.available).then_with(|| a.code.cmp(&b.code)))
        .map(|(idx, _)| idx)
}

/// Every storage location of the tenant with its free space and contents.
pub fn storage_slots<T: WarehouseTx>(tx: &mut T) -> FulfillmentResult<Vec<StorageSlot>> {
    let mut slots = Vec::new();
    for location in tx.locations()? {
        if !location.is_storage() {
            continue;
        }
        let mut stock = HashMap::new();
        for record in tx.inventory_at(location.id())? {
            if record.quantity() > 0 {
                *stock.entry(record.item_id()).or_insert(0) += record.quantity();
            }
        }
        slots.push(StorageSlot {
            location_id: location.id(),
            code: location.code().to_string(),
            available: location.available(),
            stock,
        });
    }
    Ok(slots)
}

/// Row of `GetAvailableLocations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableLocation {
    pub location_id: LocationId,
    pub code: String,
    pub available_stock: i64,
    pub current_capacity: i64,
    pub max_capacity: i64,
    pub available_capacity: i64,
}

impl AvailableLocation {
    fn new(location: &Location, available_stock: i64) -> Self {
        Self {
            location_id: location.id(),
            code: location.code().to_string(),
            available_stock,
            current_capacity: location.current_capacity(),
            max_capacity: location.max_capacity(),
            available_capacity: location.available(),
        }
    }
}

/// Storage locations holding at least `min_quantity` of pickable stock, in FIFO order.
pub fn available_locations<T: WarehouseTx>(
    tx: &mut T,
    item_id: ItemId,
    min_quantity: i64,
) -> FulfillmentResult<Vec<AvailableLocation>> {
    let mut out = Vec::new();
    for candidate in pick_candidates(tx, item_id)? {
        if candidate.quantity < min_quantity {
            continue;
        }
        if let Some(location) = tx.location(candidate.location_id)? {
            out.push(AvailableLocation::new(&location, candidate.quantity));
        }
    }
    Ok(out)
}
