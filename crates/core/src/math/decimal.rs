//! # Decimal Rescaling
//!
//! Amounts move between each asset's native precision and the 18-digit
//! common basis the pricing formulas operate in. Scaling up is exact and
//! overflow-checked; scaling down truncates.

use crate::constants::COMMON_DECIMALS;
use crate::errors::{CoreResult, StrataError};
use crate::math::safe_math::safe_mul_u128;

/// Largest power of ten representable in u128 is 10^38
pub const MAX_DECIMALS: u8 = 38;

/// Power of ten as u128. Exponents are validated at the asset boundary
/// (see [`check_decimals`]), so this never exceeds 10^38.
pub fn pow10(exp: u8) -> u128 {
    debug_assert!(exp <= MAX_DECIMALS);
    10u128.pow(exp as u32)
}

/// Validate a declared asset or feed precision
pub fn check_decimals(decimals: u8) -> CoreResult<u8> {
    if decimals > COMMON_DECIMALS {
        return Err(StrataError::InvalidParameter);
    }
    Ok(decimals)
}

/// Rescale an amount from one fractional precision to another
pub fn rescale(amount: u128, from_decimals: u8, to_decimals: u8) -> CoreResult<u128> {
    if from_decimals == to_decimals {
        return Ok(amount);
    }
    if to_decimals > from_decimals {
        safe_mul_u128(amount, pow10(to_decimals - from_decimals))
    } else {
        Ok(amount / pow10(from_decimals - to_decimals))
    }
}

/// Rescale a native amount up to the common basis
pub fn to_common(amount: u128, native_decimals: u8) -> CoreResult<u128> {
    rescale(amount, native_decimals, COMMON_DECIMALS)
}

/// Rescale a common-basis amount down to a native precision
pub fn from_common(amount: u128, native_decimals: u8) -> CoreResult<u128> {
    rescale(amount, COMMON_DECIMALS, native_decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_round_trip() {
        assert_eq!(rescale(1_000_000, 6, 18).unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(rescale(1_000_000_000_000_000_000, 18, 6).unwrap(), 1_000_000);
        assert_eq!(rescale(42, 9, 9).unwrap(), 42);
    }

    #[test]
    fn test_rescale_truncates() {
        // 1.9 in 1-decimal form becomes 1 whole unit
        assert_eq!(rescale(19, 1, 0).unwrap(), 1);
    }

    #[test]
    fn test_rescale_overflow() {
        assert_eq!(
            rescale(u128::MAX, 0, 18),
            Err(StrataError::MathOverflow)
        );
    }

    #[test]
    fn test_check_decimals() {
        assert_eq!(check_decimals(18).unwrap(), 18);
        assert_eq!(check_decimals(19), Err(StrataError::InvalidParameter));
    }
}
