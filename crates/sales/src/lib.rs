//! Sales domain module: sales orders and the pickings that fulfil them.
//!
//! This crate contains business rules for outbound documents, implemented
//! purely as deterministic domain logic (no IO, no storage).

pub mod order;
pub mod picking;

pub use order::{CustomerId, SalesOrder, SalesOrderId, SalesOrderLine, SalesOrderStatus};
pub use picking::{
    derive_picking_status, PickRequest, Picking, PickingId, PickingLine, PickingLineStatus,
    PickingStatus,
};
