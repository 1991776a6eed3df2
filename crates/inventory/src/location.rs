//! Rack locations and the capacity model.
//!
//! `current_capacity` is a materialized view of the sum of inventory
//! quantities at the location. It is adjusted in the same transaction as every
//! ledger mutation and can be rebuilt with [`Location::reconcile`].

use serde::{Deserialize, Serialize};

use depot_core::{AggregateRoot, DomainError, DomainResult, TenantId};

use crate::error::StockError;

depot_core::aggregate_id!(
    /// Warehouse location identifier.
    LocationId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    /// Rack location that stock is picked from and put away into.
    Storage,
    /// Staging area for goods received but not stored, or picked but not shipped.
    Holding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    tenant_id: TenantId,
    code: String,
    category: LocationCategory,
    max_capacity: i64,
    current_capacity: i64,
    is_full: bool,
}

/// Result of [`Location::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityChange {
    pub before: i64,
    pub after: i64,
    /// `true` when the requested delta would have left `[0, max_capacity]`.
    pub clamped: bool,
}

/// Difference between the stored capacity and the ledger total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityDrift {
    pub location_id: LocationId,
    pub code: String,
    pub recorded: i64,
    pub actual: i64,
}

impl Location {
    pub fn new(
        tenant_id: TenantId,
        id: LocationId,
        code: impl Into<String>,
        category: LocationCategory,
        max_capacity: i64,
    ) -> DomainResult<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("location code cannot be empty"));
        }
        if max_capacity <= 0 {
            return Err(DomainError::validation(format!(
                "location {code}: max_capacity must be positive"
            )));
        }

        Ok(Self {
            id,
            tenant_id,
            code,
            category,
            max_capacity,
            current_capacity: 0,
            is_full: false,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn category(&self) -> LocationCategory {
        self.category
    }

    pub fn is_storage(&self) -> bool {
        self.category == LocationCategory::Storage
    }

    pub fn max_capacity(&self) -> i64 {
        self.max_capacity
    }

    pub fn current_capacity(&self) -> i64 {
        self.current_capacity
    }

    pub fn is_full(&self) -> bool {
        self.is_full
    }

    pub fn available(&self) -> i64 {
        self.max_capacity - self.current_capacity
    }

    pub fn can_accommodate(&self, quantity: i64) -> bool {
        self.available() >= quantity
    }

    pub fn ensure_can_accommodate(&self, quantity: i64) -> Result<(), StockError> {
        if self.can_accommodate(quantity) {
            Ok(())
        } else {
            Err(StockError::InsufficientCapacity {
                available: self.available(),
                requested: quantity,
            })
        }
    }

    /// Adjust used capacity by `delta`, clamped to `[0, max_capacity]`.
    pub fn apply(&mut self, delta: i64) -> CapacityChange {
        let before = self.current_capacity;
        let target = before.saturating_add(delta);
        let after = target.clamp(0, self.max_capacity);

        self.current_capacity = after;
        self.is_full = self.current_capacity >= self.max_capacity;

        CapacityChange {
            before,
            after,
            clamped: after != target,
        }
    }

    /// Reset used capacity to the ledger total; returns the drift if any.
    pub fn reconcile(&mut self, ledger_total: i64) -> Option<CapacityDrift> {
        if ledger_total == self.current_capacity {
            return None;
        }

        let drift = CapacityDrift {
            location_id: self.id,
            code: self.code.clone(),
            recorded: self.current_capacity,
            actual: ledger_total,
        };
        self.current_capacity = ledger_total.clamp(0, self.max_capacity);
        self.is_full = self.current_capacity >= self.max_capacity;
        Some(drift)
    }
}

impl AggregateRoot for Location {
    type Id = LocationId;

    fn id(&self) -> LocationId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
