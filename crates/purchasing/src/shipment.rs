//! Inbound shipment notice (ASN): goods announced against a purchase order,
//! received into a holding location, then put away into storage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use depot_core::{AggregateRoot, DocumentNumber, DomainError, DomainResult, Lifecycle, TenantId, UserId};
use depot_inventory::{ItemId, LocationId};

use crate::fee::FeeSchedule;
use crate::order::PurchaseOrderId;

depot_core::aggregate_id!(
    /// Inbound shipment notice identifier.
    ShipmentId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    Arrived,
    /// Received into the holding location.
    Processed,
    /// Putaway has started.
    PutAway,
    Completed,
    Cancelled,
}

impl Lifecycle for ShipmentStatus {
    const ENTITY: &'static str = "shipment notice";

    fn successors(self) -> &'static [Self] {
        use ShipmentStatus::*;
        match self {
            Pending => &[InTransit, Cancelled],
            InTransit => &[Arrived, Cancelled],
            Arrived => &[Processed],
            Processed => &[PutAway, Completed],
            PutAway => &[Completed],
            Completed | Cancelled => &[],
        }
    }
}

/// One announced line.
///
/// `remaining_quantity + put_away_quantity == shipped_quantity` always holds;
/// [`ShipmentLine::add_putaway`] is the only way the counters move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    line_no: u32,
    item_id: ItemId,
    shipped_quantity: i64,
    remaining_quantity: i64,
    put_away_quantity: i64,
    unit_price: Decimal,
    fee_rate: Decimal,
    fee_amount: Decimal,
}

impl ShipmentLine {
    fn new(line_no: u32, item_id: ItemId, quantity: i64, unit_price: Decimal, fees: &FeeSchedule) -> Self {
        let fee = fees.assess(unit_price);
        Self {
            line_no,
            item_id,
            shipped_quantity: quantity,
            remaining_quantity: quantity,
            put_away_quantity: 0,
            unit_price,
            fee_rate: fee.rate,
            fee_amount: fee.amount,
        }
    }

    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn shipped_quantity(&self) -> i64 {
        self.shipped_quantity
    }

    pub fn remaining_quantity(&self) -> i64 {
        self.remaining_quantity
    }

    pub fn put_away_quantity(&self) -> i64 {
        self.put_away_quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    pub fn fee_amount(&self) -> Decimal {
        self.fee_amount
    }

    pub fn is_fully_put_away(&self) -> bool {
        self.remaining_quantity == 0
    }

    pub fn add_putaway(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("putaway quantity must be positive"));
        }
        if quantity > self.remaining_quantity {
            return Err(DomainError::validation(format!(
                "line {}: putaway quantity {quantity} exceeds remaining {}",
                self.line_no, self.remaining_quantity
            )));
        }
        self.put_away_quantity += quantity;
        self.remaining_quantity -= quantity;
        Ok(())
    }

    fn reprice(&mut self, unit_price: Decimal, fees: &FeeSchedule) {
        let fee = fees.assess(unit_price);
        self.unit_price = unit_price;
        self.fee_rate = fee.rate;
        self.fee_amount = fee.amount;
    }
}

/// Aggregate root: InboundShipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundShipment {
    id: ShipmentId,
    tenant_id: TenantId,
    number: DocumentNumber,
    purchase_order_id: PurchaseOrderId,
    holding_location_id: LocationId,
    status: ShipmentStatus,
    lines: Vec<ShipmentLine>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    received_at: Option<DateTime<Utc>>,
}

impl InboundShipment {
    pub fn new(
        tenant_id: TenantId,
        id: ShipmentId,
        number: DocumentNumber,
        purchase_order_id: PurchaseOrderId,
        holding_location_id: LocationId,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            number,
            purchase_order_id,
            holding_location_id,
            status: ShipmentStatus::Pending,
            lines: Vec::new(),
            created_by,
            created_at: at,
            updated_at: at,
            received_at: None,
        }
    }

    pub fn number(&self) -> DocumentNumber {
        self.number
    }

    pub fn purchase_order_id(&self) -> PurchaseOrderId {
        self.purchase_order_id
    }

    pub fn holding_location_id(&self) -> LocationId {
        self.holding_location_id
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn lines(&self) -> &[ShipmentLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&ShipmentLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    /// Provenance tag written on inventory rows created from a line.
    pub fn provenance(&self, line_no: u32) -> String {
        format!("{}#L{}", self.number, line_no)
    }

    pub fn add_line(
        &mut self,
        item_id: ItemId,
        quantity: i64,
        unit_price: Decimal,
        fees: &FeeSchedule,
    ) -> DomainResult<u32> {
        self.ensure_pending("add lines to")?;
        if quantity <= 0 {
            return Err(DomainError::validation("shipped quantity must be positive"));
        }
        if unit_price.is_sign_negative() {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }

        let line_no = (self.lines.len() as u32) + 1;
        self.lines
            .push(ShipmentLine::new(line_no, item_id, quantity, unit_price, fees));
        Ok(line_no)
    }

    /// Change a line's price; the fee is recomputed from the schedule.
    pub fn reprice_line(&mut self, line_no: u32, unit_price: Decimal, fees: &FeeSchedule) -> DomainResult<()> {
        self.ensure_pending("reprice")?;
        if unit_price.is_sign_negative() {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }
        let number = self.number;
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_no == line_no)
            .ok_or_else(|| DomainError::not_found(format!("line {line_no} of {number}")))?;
        line.reprice(unit_price, fees);
        Ok(())
    }

    pub fn mark_in_transit(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation(format!(
                "shipment notice {} has no lines",
                self.number
            )));
        }
        self.transition(ShipmentStatus::InTransit, at)
    }

    pub fn mark_arrived(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(ShipmentStatus::Arrived, at)
    }

    /// Goods were posted into the holding location.
    pub fn mark_processed(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(ShipmentStatus::Processed, at)?;
        self.received_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(ShipmentStatus::Cancelled, at)
    }

    /// Advance one line's putaway counters and re-derive the status.
    pub fn record_putaway(&mut self, line_no: u32, quantity: i64, at: DateTime<Utc>) -> DomainResult<()> {
        if !matches!(self.status, ShipmentStatus::Processed | ShipmentStatus::PutAway) {
            return Err(DomainError::InvalidTransition {
                entity: ShipmentStatus::ENTITY,
                from: format!("{:?}", self.status),
                to: format!("{:?}", ShipmentStatus::PutAway),
            });
        }
        let number = self.number;
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_no == line_no)
            .ok_or_else(|| DomainError::not_found(format!("line {line_no} of {number}")))?;
        line.add_putaway(quantity)?;

        let derived = self.derived_status();
        if derived != self.status {
            self.transition(derived, at)?;
        }
        self.updated_at = at;
        Ok(())
    }

    /// Status implied by the putaway counters (only meaningful once processed).
    pub fn derived_status(&self) -> ShipmentStatus {
        if !matches!(self.status, ShipmentStatus::Processed | ShipmentStatus::PutAway) {
            return self.status;
        }
        if !self.lines.is_empty() && self.lines.iter().all(ShipmentLine::is_fully_put_away) {
            ShipmentStatus::Completed
        } else if self.lines.iter().any(|l| l.put_away_quantity > 0) {
            ShipmentStatus::PutAway
        } else {
            self.status
        }
    }

    fn ensure_pending(&self, action: &str) -> DomainResult<()> {
        if self.status != ShipmentStatus::Pending {
            return Err(DomainError::invariant(format!(
                "cannot {action} shipment notice {} once it has left pending",
                self.number
            )));
        }
        Ok(())
    }

    fn transition(&mut self, next: ShipmentStatus, at: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.transition_to(next)?;
        self.updated_at = at;
        Ok(())
    }
}

impl AggregateRoot for InboundShipment {
    type Id = ShipmentId;

    fn id(&self) -> ShipmentId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
