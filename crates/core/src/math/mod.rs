//! # Math Module
//!
//! Overflow-checked arithmetic, 256-bit intermediates for mul-div chains,
//! and decimal rescaling helpers.

pub mod big_int;
pub mod decimal;
pub mod safe_math;

pub use big_int::{mul_div_u128, Rounding, U256};
pub use decimal::*;
pub use safe_math::*;
