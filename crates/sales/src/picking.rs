//! Picking documents: the plan (and progress) for moving stock out of
//! storage into a sales order's holding location.
//!
//! Line and document statuses are never set directly. They are re-derived
//! from the picked quantities by [`PickingLine::status`] and
//! [`derive_picking_status`] after every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::{
    AggregateRoot, DocumentNumber, DomainError, DomainResult, Lifecycle, Progress, ProgressState,
    TenantId, UserId,
};
use depot_inventory::{ItemId, LocationId};

use crate::order::SalesOrderId;

depot_core::aggregate_id!(
    /// Picking identifier.
    PickingId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickingStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Lifecycle for PickingStatus {
    const ENTITY: &'static str = "picking";

    fn successors(self) -> &'static [Self] {
        use PickingStatus::*;
        match self {
            Pending => &[InProgress, Completed, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickingLineStatus {
    Pending,
    Short,
    Picked,
}

impl From<ProgressState> for PickingLineStatus {
    fn from(state: ProgressState) -> Self {
        match state {
            ProgressState::NotStarted => PickingLineStatus::Pending,
            ProgressState::Partial => PickingLineStatus::Short,
            ProgressState::Done => PickingLineStatus::Picked,
        }
    }
}

/// One planned pick: a quantity of an item from one source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickingLine {
    line_no: u32,
    sales_order_line: u32,
    item_id: ItemId,
    source_location_id: LocationId,
    progress: Progress,
}

impl PickingLine {
    pub fn planned(
        line_no: u32,
        sales_order_line: u32,
        item_id: ItemId,
        source_location_id: LocationId,
        quantity_required: i64,
    ) -> DomainResult<Self> {
        Ok(Self {
            line_no,
            sales_order_line,
            item_id,
            source_location_id,
            progress: Progress::new(quantity_required)?,
        })
    }

    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    pub fn sales_order_line(&self) -> u32 {
        self.sales_order_line
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn source_location_id(&self) -> LocationId {
        self.source_location_id
    }

    pub fn quantity_required(&self) -> i64 {
        self.progress.required()
    }

    pub fn quantity_picked(&self) -> i64 {
        self.progress.done()
    }

    pub fn remaining_quantity(&self) -> i64 {
        self.progress.remaining()
    }

    pub fn status(&self) -> PickingLineStatus {
        self.progress.state().into()
    }
}

/// One entry of a ProcessPicking batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRequest {
    pub line_no: u32,
    pub quantity: i64,
    pub source_location_id: LocationId,
}

/// Document status implied by the line quantities.
///
/// Terminal statuses are kept; `Completed` needs a non-empty line set with
/// every line picked; `InProgress` needs some picked quantity; otherwise the
/// current status is returned unchanged.
pub fn derive_picking_status(current: PickingStatus, lines: &[PickingLine]) -> PickingStatus {
    if current.is_terminal() {
        return current;
    }
    if !lines.is_empty() && lines.iter().all(|l| l.status() == PickingLineStatus::Picked) {
        PickingStatus::Completed
    } else if lines.iter().any(|l| l.quantity_picked() > 0) {
        PickingStatus::InProgress
    } else {
        current
    }
}

/// Aggregate root: Picking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picking {
    id: PickingId,
    tenant_id: TenantId,
    number: DocumentNumber,
    sales_order_id: SalesOrderId,
    status: PickingStatus,
    lines: Vec<PickingLine>,
    notes: Option<String>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Picking {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        id: PickingId,
        number: DocumentNumber,
        sales_order_id: SalesOrderId,
        lines: Vec<PickingLine>,
        notes: Option<String>,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("a picking needs at least one line"));
        }

        Ok(Self {
            id,
            tenant_id,
            number,
            sales_order_id,
            status: PickingStatus::Pending,
            lines,
            notes,
            created_by,
            created_at: at,
            updated_at: at,
            completed_at: None,
        })
    }

    pub fn number(&self) -> DocumentNumber {
        self.number
    }

    pub fn sales_order_id(&self) -> SalesOrderId {
        self.sales_order_id
    }

    pub fn status(&self) -> PickingStatus {
        self.status
    }

    pub fn lines(&self) -> &[PickingLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&PickingLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Anything but Cancelled blocks creating another picking for the order.
    pub fn is_active(&self) -> bool {
        self.status != PickingStatus::Cancelled
    }

    pub fn ensure_processable(&self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "picking {} is {:?} and cannot be processed",
                self.number, self.status
            )));
        }
        Ok(())
    }

    /// Validate a pick against the plan without mutating anything.
    pub fn check_pick(&self, request: &PickRequest) -> DomainResult<&PickingLine> {
        self.ensure_processable()?;
        let line = self.line(request.line_no).ok_or_else(|| {
            DomainError::not_found(format!("line {} of picking {}", request.line_no, self.number))
        })?;
        if line.source_location_id != request.source_location_id {
            return Err(DomainError::validation(format!(
                "picking {} line {}: stock must be picked from the planned location",
                self.number, request.line_no
            )));
        }
        if request.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "picking {} line {}: quantity must be positive (got {})",
                self.number, request.line_no, request.quantity
            )));
        }
        if request.quantity > line.remaining_quantity() {
            return Err(DomainError::validation(format!(
                "picking {} line {}: quantity {} exceeds remaining {}",
                self.number,
                request.line_no,
                request.quantity,
                line.remaining_quantity()
            )));
        }
        Ok(line)
    }

    /// Advance one line. Statuses are re-derived by [`Picking::recompute_status`].
    pub fn record_pick(&mut self, request: &PickRequest, at: DateTime<Utc>) -> DomainResult<()> {
        self.check_pick(request)?;
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_no == request.line_no)
            .ok_or_else(|| DomainError::not_found(format!("picking line {}", request.line_no)))?;
        line.progress.advance(request.quantity)?;
        self.updated_at = at;
        Ok(())
    }

    /// Re-derive the document status from the lines; stamps `completed_at`.
    pub fn recompute_status(&mut self, at: DateTime<Utc>) -> DomainResult<PickingStatus> {
        let derived = derive_picking_status(self.status, &self.lines);
        if derived != self.status {
            self.status = self.status.transition_to(derived)?;
            self.updated_at = at;
            if derived == PickingStatus::Completed {
                self.completed_at = Some(at);
            }
        }
        Ok(self.status)
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.transition_to(PickingStatus::Cancelled)?;
        self.updated_at = at;
        Ok(())
    }
}

impl AggregateRoot for Picking {
    type Id = PickingId;

    fn id(&self) -> PickingId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
