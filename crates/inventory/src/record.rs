//! Per-(item, location) stock rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use depot_core::{AggregateRoot, TenantId};

use crate::error::StockError;
use crate::item::ItemId;
use crate::location::LocationId;

/// Store key of an inventory row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub item_id: ItemId,
    pub location_id: LocationId,
}

impl StockKey {
    pub fn new(item_id: ItemId, location_id: LocationId) -> Self {
        Self {
            item_id,
            location_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryStatus {
    Available,
    Reserved,
    Damaged,
    Quarantine,
    Blocked,
    /// Quantity reached zero; the row is kept for history.
    Empty,
}

/// Stock of one item at one location.
///
/// Rows are never deleted. Reducing to zero marks the row `Empty`; new stock
/// arriving at an `Empty` row makes it `Available` again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    tenant_id: TenantId,
    item_id: ItemId,
    location_id: LocationId,
    quantity: i64,
    status: InventoryStatus,
    average_cost: Decimal,
    provenance: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Precision kept for weighted-average costs.
const COST_SCALE: u32 = 6;

impl InventoryRecord {
    /// First arrival of an item at a location.
    pub fn open(
        tenant_id: TenantId,
        key: StockKey,
        quantity: i64,
        unit_cost: Decimal,
        provenance: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Self, StockError> {
        ensure_positive(quantity)?;
        if unit_cost.is_sign_negative() {
            return Err(StockError::NegativeCost);
        }

        Ok(Self {
            tenant_id,
            item_id: key.item_id,
            location_id: key.location_id,
            quantity,
            status: InventoryStatus::Available,
            average_cost: unit_cost,
            provenance,
            created_at: at,
            updated_at: at,
        })
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.location_id)
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> InventoryStatus {
        self.status
    }

    pub fn average_cost(&self) -> Decimal {
        self.average_cost
    }

    pub fn provenance(&self) -> Option<&str> {
        self.provenance.as_deref()
    }

    /// FIFO key: when stock first arrived at this location.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Stock that the picking planner may allocate from.
    pub fn is_pickable(&self) -> bool {
        self.status == InventoryStatus::Available && self.quantity > 0
    }

    /// Merge an arrival using weighted-average cost.
    pub fn add(
        &mut self,
        quantity: i64,
        unit_cost: Decimal,
        provenance: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StockError> {
        ensure_positive(quantity)?;
        if unit_cost.is_sign_negative() {
            return Err(StockError::NegativeCost);
        }

        let old_qty = Decimal::from(self.quantity);
        let new_qty = Decimal::from(quantity);
        let total = old_qty + new_qty;
        self.average_cost = ((old_qty * self.average_cost + new_qty * unit_cost) / total)
            .round_dp(COST_SCALE)
            .normalize();

        self.quantity += quantity;
        if self.status == InventoryStatus::Empty {
            self.status = InventoryStatus::Available;
        }
        if self.provenance.is_none() {
            self.provenance = provenance;
        }
        self.updated_at = at;
        Ok(())
    }

    /// Remove stock; fails without mutating when the row holds less than asked.
    pub fn reduce(&mut self, quantity: i64, at: DateTime<Utc>) -> Result<(), StockError> {
        ensure_positive(quantity)?;
        if quantity > self.quantity {
            return Err(StockError::InsufficientStock {
                available: self.quantity,
                requested: quantity,
            });
        }

        self.quantity -= quantity;
        if self.quantity == 0 {
            self.status = InventoryStatus::Empty;
        }
        self.updated_at = at;
        Ok(())
    }

    /// Manual status change (quarantine, damage, blocking).
    pub fn change_status(&mut self, status: InventoryStatus, at: DateTime<Utc>) -> Result<(), StockError> {
        match (status, self.quantity) {
            (InventoryStatus::Empty, q) if q > 0 => {
                return Err(StockError::InvalidStatus(format!(
                    "cannot mark a row holding {q} units as empty"
                )));
            }
            (s, 0) if s != InventoryStatus::Empty => {
                return Err(StockError::InvalidStatus(format!(
                    "cannot mark an empty row as {s:?}"
                )));
            }
            _ => {}
        }
        self.status = status;
        self.updated_at = at;
        Ok(())
    }
}

impl AggregateRoot for InventoryRecord {
    type Id = StockKey;

    fn id(&self) -> StockKey {
        self.key()
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

fn ensure_positive(quantity: i64) -> Result<(), StockError> {
    if quantity <= 0 {
        return Err(StockError::InvalidQuantity { quantity });
    }
    Ok(())
}
