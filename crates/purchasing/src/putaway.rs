//! Putaway documents: received goods moving from an ASN's holding location
//! into storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::{
    AggregateRoot, DocumentNumber, DomainError, DomainResult, Lifecycle, Progress, ProgressState,
    TenantId, UserId,
};
use depot_inventory::{ItemId, LocationId};

use crate::shipment::ShipmentId;

depot_core::aggregate_id!(
    /// Putaway identifier.
    PutawayId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutawayStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Lifecycle for PutawayStatus {
    const ENTITY: &'static str = "putaway";

    fn successors(self) -> &'static [Self] {
        use PutawayStatus::*;
        match self {
            Pending => &[InProgress, Completed, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutawayLineStatus {
    Pending,
    Partial,
    Stored,
}

impl From<ProgressState> for PutawayLineStatus {
    fn from(state: ProgressState) -> Self {
        match state {
            ProgressState::NotStarted => PutawayLineStatus::Pending,
            ProgressState::Partial => PutawayLineStatus::Partial,
            ProgressState::Done => PutawayLineStatus::Stored,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutawayLine {
    line_no: u32,
    shipment_line: u32,
    item_id: ItemId,
    destination_location_id: LocationId,
    progress: Progress,
}

impl PutawayLine {
    pub fn planned(
        line_no: u32,
        shipment_line: u32,
        item_id: ItemId,
        destination_location_id: LocationId,
        quantity_required: i64,
    ) -> DomainResult<Self> {
        Ok(Self {
            line_no,
            shipment_line,
            item_id,
            destination_location_id,
            progress: Progress::new(quantity_required)?,
        })
    }

    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    pub fn shipment_line(&self) -> u32 {
        self.shipment_line
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn destination_location_id(&self) -> LocationId {
        self.destination_location_id
    }

    pub fn quantity_required(&self) -> i64 {
        self.progress.required()
    }

    pub fn quantity_put_away(&self) -> i64 {
        self.progress.done()
    }

    pub fn remaining_quantity(&self) -> i64 {
        self.progress.remaining()
    }

    pub fn status(&self) -> PutawayLineStatus {
        self.progress.state().into()
    }
}

/// One entry of a ProcessPutaway batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutawayRequest {
    pub line_no: u32,
    pub quantity: i64,
    pub destination_location_id: LocationId,
}

pub fn derive_putaway_status(current: PutawayStatus, lines: &[PutawayLine]) -> PutawayStatus {
    if current.is_terminal() {
        return current;
    }
    if !lines.is_empty() && lines.iter().all(|l| l.status() == PutawayLineStatus::Stored) {
        PutawayStatus::Completed
    } else if lines.iter().any(|l| l.quantity_put_away() > 0) {
        PutawayStatus::InProgress
    } else {
        current
    }
}

/// Aggregate root: Putaway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Putaway {
    id: PutawayId,
    tenant_id: TenantId,
    number: DocumentNumber,
    shipment_id: ShipmentId,
    status: PutawayStatus,
    lines: Vec<PutawayLine>,
    notes: Option<String>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Putaway {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        id: PutawayId,
        number: DocumentNumber,
        shipment_id: ShipmentId,
        lines: Vec<PutawayLine>,
        notes: Option<String>,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("a putaway needs at least one line"));
        }

        Ok(Self {
            id,
            tenant_id,
            number,
            shipment_id,
            status: PutawayStatus::Pending,
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

    pub fn shipment_id(&self) -> ShipmentId {
        self.shipment_id
    }

    pub fn status(&self) -> PutawayStatus {
        self.status
    }

    pub fn lines(&self) -> &[PutawayLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&PutawayLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_active(&self) -> bool {
        self.status != PutawayStatus::Cancelled
    }

    pub fn check_store(&self, request: &PutawayRequest) -> DomainResult<&PutawayLine> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "putaway {} is {:?} and cannot be processed",
                self.number, self.status
            )));
        }
        let line = self.line(request.line_no).ok_or_else(|| {
            DomainError::not_found(format!("line {} of putaway {}", request.line_no, self.number))
        })?;
        if line.destination_location_id != request.destination_location_id {
            return Err(DomainError::validation(format!(
                "putaway {} line {}: stock must go to the planned location",
                self.number, request.line_no
            )));
        }
        if request.quantity <= 0 || request.quantity > line.remaining_quantity() {
            return Err(DomainError::validation(format!(
                "putaway {} line {}: quantity {} must be within 1..={}",
                self.number,
                request.line_no,
                request.quantity,
                line.remaining_quantity()
            )));
        }
        Ok(line)
    }

    pub fn record_store(&mut self, request: &PutawayRequest, at: DateTime<Utc>) -> DomainResult<()> {
        self.check_store(request)?;
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.line_no == request.line_no)
            .ok_or_else(|| DomainError::not_found(format!("putaway line {}", request.line_no)))?;
        line.progress.advance(request.quantity)?;
        self.updated_at = at;
        Ok(())
    }

    pub fn recompute_status(&mut self, at: DateTime<Utc>) -> DomainResult<PutawayStatus> {
        let derived = derive_putaway_status(self.status, &self.lines);
        if derived != self.status {
            self.status = self.status.transition_to(derived)?;
            self.updated_at = at;
            if derived == PutawayStatus::Completed {
                self.completed_at = Some(at);
            }
        }
        Ok(self.status)
    }
}

impl AggregateRoot for Putaway {
    type Id = PutawayId;

    fn id(&self) -> PutawayId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
