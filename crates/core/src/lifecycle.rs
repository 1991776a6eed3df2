//! Closed status enums with explicit transition tables.

use crate::error::{DomainError, DomainResult};

/// A document status whose legal moves are listed in a transition table.
///
/// Any transition not listed by [`Lifecycle::successors`] is rejected with
/// [`DomainError::InvalidTransition`].
pub trait Lifecycle: Copy + Eq + core::fmt::Debug + 'static {
    /// Entity name used in error messages (e.g. "sales order").
    const ENTITY: &'static str;

    /// Statuses reachable from `self` in one step.
    fn successors(self) -> &'static [Self];

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    /// Validate a transition and return the new status.
    fn transition_to(self, next: Self) -> DomainResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                entity: Self::ENTITY,
                from: format!("{self:?}"),
                to: format!("{next:?}"),
            })
        }
    }
}
