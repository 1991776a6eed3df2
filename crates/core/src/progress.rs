//! Required-vs-done counters shared by picking and putaway lines.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Monotonic progress of one task line.
///
/// Only `required` and `done` are stored, so `done + remaining == required`
/// holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    required: i64,
    done: i64,
}

/// Derived state of a [`Progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    NotStarted,
    Partial,
    Done,
}

impl Progress {
    pub fn new(required: i64) -> DomainResult<Self> {
        if required <= 0 {
            return Err(DomainError::validation(format!(
                "required quantity must be positive (got {required})"
            )));
        }
        Ok(Self { required, done: 0 })
    }

    pub fn required(&self) -> i64 {
        self.required
    }

    pub fn done(&self) -> i64 {
        self.done
    }

    pub fn remaining(&self) -> i64 {
        self.required - self.done
    }

    pub fn state(&self) -> ProgressState {
        if self.remaining() == 0 {
            ProgressState::Done
        } else if self.done > 0 {
            ProgressState::Partial
        } else {
            ProgressState::NotStarted
        }
    }

    /// Record `quantity` more units; rejected (unchanged) when it exceeds `remaining`.
    pub fn advance(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive (got {quantity})"
            )));
        }
        if quantity > self.remaining() {
            return Err(DomainError::validation(format!(
                "quantity {quantity} exceeds remaining {}",
                self.remaining()
            )));
        }
        self.done += quantity;
        Ok(())
    }
}
