//! Transactional warehouse store boundary.
//!
//! Workflows read and stage writes inside a [`WarehouseTx`]; nothing is
//! visible to other transactions until `commit` succeeds. Row versions are
//! tracked by the store, not by the domain types.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryTx, InMemoryWarehouseStore};
pub use r#trait::{StoreError, StoreResult, WarehouseStore, WarehouseTx};
