//! `depot-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the warehouse
//! modules (no storage, no IO).

pub mod aggregate;
pub mod document;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod progress;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use document::{DocumentKind, DocumentNumber};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};
pub use lifecycle::Lifecycle;
pub use progress::{Progress, ProgressState};
