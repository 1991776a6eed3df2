use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use depot_core::{AggregateRoot, DocumentNumber, DomainError, DomainResult, Lifecycle, TenantId, UserId};
use depot_inventory::{ItemId, LocationId};

depot_core::aggregate_id!(
    /// Sales order identifier (tenant-scoped via `tenant_id`).
    SalesOrderId
);

depot_core::aggregate_id!(
    /// Customer reference (master data owned elsewhere).
    CustomerId
);

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesOrderStatus {
    Pending,
    InProgress,
    Picked,
    Shipped,
    Cancelled,
}

impl Lifecycle for SalesOrderStatus {
    const ENTITY: &'static str = "sales order";

    fn successors(self) -> &'static [Self] {
        use SalesOrderStatus::*;
        match self {
            Pending => &[InProgress, Cancelled],
            // Back to Pending when its picking is cancelled.
            InProgress => &[Picked, Pending, Cancelled],
            Picked => &[Shipped],
            Shipped | Cancelled => &[],
        }
    }
}

/// Order line: item, required quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    pub line_no: u32,
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Aggregate root: SalesOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrder {
    id: SalesOrderId,
    tenant_id: TenantId,
    number: DocumentNumber,
    customer_id: CustomerId,
    status: SalesOrderStatus,
    holding_location_id: Option<LocationId>,
    lines: Vec<SalesOrderLine>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    shipped_at: Option<DateTime<Utc>>,
}

impl SalesOrder {
    pub fn new(
        tenant_id: TenantId,
        id: SalesOrderId,
        number: DocumentNumber,
        customer_id: CustomerId,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            number,
            customer_id,
            status: SalesOrderStatus::Pending,
            holding_location_id: None,
            lines: Vec::new(),
            created_by,
            created_at: at,
            updated_at: at,
            shipped_at: None,
        }
    }

    pub fn number(&self) -> DocumentNumber {
        self.number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn status(&self) -> SalesOrderStatus {
        self.status
    }

    pub fn holding_location_id(&self) -> Option<LocationId> {
        self.holding_location_id
    }

    pub fn lines(&self) -> &[SalesOrderLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&SalesOrderLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, SalesOrderStatus::Pending)
    }

    /// Statuses from which a picking may be created.
    pub fn is_pickable(&self) -> bool {
        matches!(self.status, SalesOrderStatus::Pending | SalesOrderStatus::InProgress)
    }

    pub fn add_line(&mut self, item_id: ItemId, quantity: i64, unit_price: Decimal) -> DomainResult<u32> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(format!(
                "cannot modify sales order {} once picking has started",
                self.number
            )));
        }
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if unit_price.is_sign_negative() {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }

        let line_no = (self.lines.len() as u32) + 1;
        self.lines.push(SalesOrderLine {
            line_no,
            item_id,
            quantity,
            unit_price,
        });
        Ok(line_no)
    }

    /// Holding location that picked goods are staged in.
    pub fn assign_holding_location(&mut self, location_id: LocationId, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(format!(
                "cannot change holding location of sales order {} once picking has started",
                self.number
            )));
        }
        self.holding_location_id = Some(location_id);
        self.updated_at = at;
        Ok(())
    }

    pub fn require_holding_location(&self) -> DomainResult<LocationId> {
        self.holding_location_id.ok_or_else(|| {
            DomainError::invariant(format!(
                "sales order {} has no holding location",
                self.number
            ))
        })
    }

    /// Pending → InProgress; already InProgress is accepted as-is.
    pub fn start_picking(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status == SalesOrderStatus::InProgress {
            return Ok(());
        }
        self.transition(SalesOrderStatus::InProgress, at)
    }

    pub fn mark_picked(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(SalesOrderStatus::Picked, at)
    }

    /// Picking was cancelled: the order waits for a new one.
    pub fn reopen(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(SalesOrderStatus::Pending, at)
    }

    pub fn ship(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(SalesOrderStatus::Shipped, at)?;
        self.shipped_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(SalesOrderStatus::Cancelled, at)
    }

    fn transition(&mut self, next: SalesOrderStatus, at: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.transition_to(next)?;
        self.updated_at = at;
        Ok(())
    }
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> SalesOrderId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
