//! # Call Guards
//!
//! One-shot deadline validation and the reentrancy flag public operations
//! hold for their full duration.

use strata_core::errors::{CoreResult, StrataError};

/// Reject a call whose caller-specified expiry has passed. A `None`
/// deadline means the caller opted out of the check.
pub fn check_deadline(deadline: Option<i64>, now: i64) -> CoreResult<()> {
    match deadline {
        Some(expiry) if expiry < now => Err(StrataError::TransactionTooOld),
        _ => Ok(()),
    }
}

/// Exclusive lock held across an entire state-mutating call, including any
/// external transfer or notification it performs.
#[derive(Debug, Default, Clone)]
pub struct ReentrancyFlag {
    locked: bool,
}

impl ReentrancyFlag {
    pub fn acquire(&mut self) -> CoreResult<()> {
        if self.locked {
            return Err(StrataError::Reentrancy);
        }
        self.locked = true;
        Ok(())
    }

    pub fn release(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
