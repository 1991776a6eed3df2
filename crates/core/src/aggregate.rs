//! Aggregate root trait and optimistic concurrency expectations.

use crate::error::{DomainError, DomainResult};
use crate::id::TenantId;

/// Aggregate root marker + minimal interface.
///
/// Documents and ledger rows are plain values; the store tracks their row
/// versions and checks them on commit (see [`ExpectedVersion`]).
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier (the store key).
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> Self::Id;

    /// Tenant that owns this aggregate.
    fn tenant_id(&self) -> TenantId;
}

/// Optimistic concurrency expectation for a stored row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// The row must not exist yet.
    Absent,
    /// Require the row to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// `actual` is `None` when the row does not exist.
    pub fn matches(self, actual: Option<u64>) -> bool {
        match (self, actual) {
            (ExpectedVersion::Any, _) => true,
            (ExpectedVersion::Absent, None) => true,
            (ExpectedVersion::Absent, Some(_)) => false,
            (ExpectedVersion::Exact(v), Some(a)) => v == a,
            (ExpectedVersion::Exact(_), None) => false,
        }
    }

    pub fn check(self, actual: Option<u64>) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual:?})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_must_match_existing_row() {
        assert!(ExpectedVersion::Exact(3).matches(Some(3)));
        assert!(!ExpectedVersion::Exact(3).matches(Some(4)));
        assert!(!ExpectedVersion::Exact(3).matches(None));
    }

    #[test]
    fn absent_rejects_concurrently_inserted_row() {
        assert!(ExpectedVersion::Absent.matches(None));
        let err = ExpectedVersion::Absent.check(Some(1)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn any_skips_the_check() {
        assert!(ExpectedVersion::Any.check(None).is_ok());
        assert!(ExpectedVersion::Any.check(Some(9)).is_ok());
    }
}
