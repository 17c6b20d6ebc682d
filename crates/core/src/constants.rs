//! # Protocol Constants
//!
//! Fundamental constants for the tranche pool:
//! - Fixed-point precision bases
//! - Bond face value and collateralization thresholds
//! - Under-collateralized value split
//! - Fee and time parameters

// ============================================================================
// Fixed-Point Precision
// ============================================================================

/// Six-digit fixed-point scale used by rates and ratios (1_000_000 = 1.0)
pub const PRECISION: u128 = 1_000_000;

/// Fractional digits of the common basis all amounts are normalized to
pub const COMMON_DECIMALS: u8 = 18;

/// Fractional digits of the canonical coupon-share unit
pub const SHARES_DECIMALS: u8 = 6;

// ============================================================================
// Tranche Pricing
// ============================================================================

/// Face value of one bond unit in the pool's unit of account
pub const BOND_TARGET_PRICE: u128 = 100;

/// Collateral level at or below which the pool prices as under-collateralized
/// (PRECISION scale, 1_200_000 = 120%)
pub const COLLATERAL_THRESHOLD: u128 = 1_200_000;

/// Bond share of total value in the under-collateralized regime (80%)
pub const POINT_EIGHT: u128 = 800_000;

/// Leverage share of total value in the under-collateralized regime (20%)
pub const POINT_TWO: u128 = 200_000;

// ============================================================================
// Fees and Time
// ============================================================================

/// Upper bound on the pool fee rate (PRECISION scale, 10%)
pub const MAX_FEE: u128 = 100_000;

/// Seconds in a (non-leap) year, the fee accrual denominator
pub const SECONDS_PER_YEAR: i64 = 31_536_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_validity() {
        assert_eq!(POINT_EIGHT + POINT_TWO, PRECISION);
        assert!(COLLATERAL_THRESHOLD > PRECISION);
        assert!(MAX_FEE < PRECISION);
        assert!(SHARES_DECIMALS < COMMON_DECIMALS);
    }
}
