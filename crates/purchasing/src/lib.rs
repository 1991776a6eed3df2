//! Purchasing domain module: purchase orders, inbound shipment notices (ASN),
//! putaway documents and the warehouse fee schedule applied to inbound lines.
//!
//! This crate contains business rules only (no IO, no storage).

pub mod fee;
pub mod order;
pub mod putaway;
pub mod shipment;

pub use fee::{FeeAssessment, FeeSchedule};
pub use order::{PurchaseOrder, PurchaseOrderId, PurchaseOrderLine, PurchaseOrderStatus, SupplierId};
pub use putaway::{
    derive_putaway_status, Putaway, PutawayId, PutawayLine, PutawayLineStatus, PutawayRequest, PutawayStatus,
};
pub use shipment::{InboundShipment, ShipmentId, ShipmentLine, ShipmentStatus};
