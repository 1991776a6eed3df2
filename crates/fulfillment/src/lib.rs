//! Fulfillment engine: allocates stock across locations, moves it
//! atomically and drives the document state machines coupled to it.
//!
//! Layering (leaves first): [`store`] → [`ledger`] → [`planner`] /
//! [`executor`] → [`engine`]. Domain rules live in the `depot-*` domain
//! crates; this crate sequences them inside store transactions.

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod planner;
pub mod store;

pub use config::FulfillmentConfig;
pub use engine::{DocumentRef, FulfillmentEngine, LineInput};
pub use error::{ErrorKind, ErrorResponse, FulfillmentError, FulfillmentResult};
pub use executor::{MoveKind, MoveOutcome};
pub use planner::{AvailableLocation, PickPlan, PickPool};
pub use store::{InMemoryWarehouseStore, StoreError, WarehouseStore, WarehouseTx};
