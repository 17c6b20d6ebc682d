//! # Strata Core - Pricing Math and Shared Types
//!
//! This crate contains the pure, stateless layer of the Strata tranche
//! protocol. It provides:
//!
//! - The tiered creation/redemption pricing formulas
//! - Overflow-checked fixed-point arithmetic with 256-bit intermediates
//! - Decimal rescaling between native asset precisions and the common basis
//! - Constants, error taxonomy, and shared type definitions
//!
//! Nothing in this crate holds balances or periods; the stateful engine and
//! share ledger live in `strata-pool`.

pub mod constants;
pub mod errors;
pub mod math;
pub mod pricing;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use errors::{CoreResult, StrataError};
pub use types::*;
