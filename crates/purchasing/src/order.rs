use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use depot_core::{AggregateRoot, DocumentNumber, DomainError, DomainResult, Lifecycle, TenantId, UserId};
use depot_inventory::ItemId;

depot_core::aggregate_id!(
    /// Purchase order identifier (tenant-scoped via `tenant_id`).
    PurchaseOrderId
);

depot_core::aggregate_id!(
    /// Supplier reference (master data owned elsewhere).
    SupplierId
);

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Draft,
    Sent,
    Received,
    Cancelled,
}

impl Lifecycle for PurchaseOrderStatus {
    const ENTITY: &'static str = "purchase order";

    fn successors(self) -> &'static [Self] {
        use PurchaseOrderStatus::*;
        match self {
            Draft => &[Sent, Cancelled],
            Sent => &[Received, Cancelled],
            Received | Cancelled => &[],
        }
    }
}

/// Purchase order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub line_no: u32,
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    tenant_id: TenantId,
    number: DocumentNumber,
    supplier_id: SupplierId,
    status: PurchaseOrderStatus,
    lines: Vec<PurchaseOrderLine>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn new(
        tenant_id: TenantId,
        id: PurchaseOrderId,
        number: DocumentNumber,
        supplier_id: SupplierId,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            number,
            supplier_id,
            status: PurchaseOrderStatus::Draft,
            lines: Vec::new(),
            created_by,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn number(&self) -> DocumentNumber {
        self.number
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[PurchaseOrderLine] {
        &self.lines
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn line_for_item(&self, item_id: ItemId) -> Option<&PurchaseOrderLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, PurchaseOrderStatus::Draft)
    }

    /// Append a line (Draft only). Returns the new line number.
    pub fn add_line(&mut self, item_id: ItemId, quantity: i64, unit_price: Decimal) -> DomainResult<u32> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(format!(
                "purchase order {} can only be modified while draft",
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
        self.lines.push(PurchaseOrderLine {
            line_no,
            item_id,
            quantity,
            unit_price,
        });
        Ok(line_no)
    }

    pub fn send(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation(format!(
                "cannot send purchase order {} without lines",
                self.number
            )));
        }
        self.transition(PurchaseOrderStatus::Sent, at)
    }

    pub fn mark_received(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(PurchaseOrderStatus::Received, at)
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(PurchaseOrderStatus::Cancelled, at)
    }

    fn transition(&mut self, next: PurchaseOrderStatus, at: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.transition_to(next)?;
        self.updated_at = at;
        Ok(())
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> PurchaseOrderId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
