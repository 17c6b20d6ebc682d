//! # Safe Math Operations
//!
//! Overflow-checked u128 arithmetic returning protocol errors.

use crate::errors::{CoreResult, StrataError};

/// Safe addition with overflow check
pub fn safe_add_u128(a: u128, b: u128) -> CoreResult<u128> {
    a.checked_add(b).ok_or(StrataError::MathOverflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub_u128(a: u128, b: u128) -> CoreResult<u128> {
    a.checked_sub(b).ok_or(StrataError::MathUnderflow)
}

/// Safe multiplication with overflow check
pub fn safe_mul_u128(a: u128, b: u128) -> CoreResult<u128> {
    a.checked_mul(b).ok_or(StrataError::MathOverflow)
}

/// Safe division with zero check
pub fn safe_div_u128(a: u128, b: u128) -> CoreResult<u128> {
    if b == 0 {
        return Err(StrataError::DivisionByZero);
    }
    Ok(a / b)
}
