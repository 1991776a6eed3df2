//! Inventory domain module: items, locations with capacity, and the
//! per-(item, location) stock ledger.
//!
//! This crate contains business rules for stock bookkeeping, implemented purely
//! as deterministic domain logic (no IO, no storage). Transactions that touch
//! several rows live in `depot-fulfillment`.

pub mod error;
pub mod item;
pub mod location;
pub mod record;

pub use error::StockError;
pub use item::{Item, ItemId};
pub use location::{CapacityChange, CapacityDrift, Location, LocationCategory, LocationId};
pub use record::{InventoryRecord, InventoryStatus, StockKey};
