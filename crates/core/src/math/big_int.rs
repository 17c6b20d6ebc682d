//! # 256-bit Intermediates
//!
//! The pricing formulas chain three multiplications (amount, price, rate
//! precision) before dividing back down, which overflows u128 for realistic
//! magnitudes. This module provides a minimal U256 sufficient for those
//! chains: full 128x128 widening multiply, multiply by a u128 scalar, and
//! division by a u128 divisor.

use crate::errors::{CoreResult, StrataError};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// 256-bit unsigned integer for intermediate calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U256 {
    /// Low 128 bits
    lo: u128,
    /// High 128 bits
    hi: u128,
}

impl U256 {
    pub const ZERO: U256 = U256 { lo: 0, hi: 0 };

    /// Create from a single u128 value
    pub const fn from_u128(value: u128) -> Self {
        Self { lo: value, hi: 0 }
    }

    /// Full widening multiplication of two u128 values
    pub fn from_mul(a: u128, b: u128) -> Self {
        // Schoolbook multiply over u64 limbs
        let a_lo = a as u64;
        let a_hi = (a >> 64) as u64;
        let b_lo = b as u64;
        let b_hi = (b >> 64) as u64;

        let ll = (a_lo as u128) * (b_lo as u128);
        let lh = (a_lo as u128) * (b_hi as u128);
        let hl = (a_hi as u128) * (b_lo as u128);
        let hh = (a_hi as u128) * (b_hi as u128);

        let (mid, mid_carry) = lh.overflowing_add(hl);
        let (lo, lo_carry) = ll.overflowing_add(mid << 64);
        let hi = hh
            + (mid >> 64)
            + ((mid_carry as u128) << 64)
            + lo_carry as u128;

        Self { lo, hi }
    }

    /// Check if the value is zero
    pub const fn is_zero(&self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    /// Convert to u128, returning None if the high half is occupied
    pub fn to_u128(self) -> Option<u128> {
        if self.hi == 0 {
            Some(self.lo)
        } else {
            None
        }
    }

    /// Multiply by a u128 scalar, failing on 256-bit overflow
    pub fn checked_mul_u128(self, m: u128) -> CoreResult<U256> {
        let low = U256::from_mul(self.lo, m);
        let high = U256::from_mul(self.hi, m);
        if high.hi != 0 {
            return Err(StrataError::MathOverflow);
        }
        let hi = low
            .hi
            .checked_add(high.lo)
            .ok_or(StrataError::MathOverflow)?;
        Ok(U256 { lo: low.lo, hi })
    }

    /// Divide by a u128 divisor, returning quotient and remainder
    pub fn div_rem_u128(self, divisor: u128) -> CoreResult<(U256, u128)> {
        if divisor == 0 {
            return Err(StrataError::DivisionByZero);
        }
        if self.hi == 0 {
            return Ok((U256::from_u128(self.lo / divisor), self.lo % divisor));
        }

        // Binary long division, msb first. Invariant: rem < divisor at the
        // top of each iteration, so the shifted value fits in 129 bits and
        // the carry bit alone decides the subtract when it overflows u128.
        let mut quotient = U256::ZERO;
        let mut rem: u128 = 0;
        let top = 255 - self.leading_zeros();
        for i in (0..=top).rev() {
            let carry = rem >> 127;
            rem = (rem << 1) | self.bit(i);
            if carry == 1 || rem >= divisor {
                rem = rem.wrapping_sub(divisor);
                quotient.set_bit(i);
            }
        }
        Ok((quotient, rem))
    }

    /// Divide by a u128 divisor, discarding the remainder
    pub fn checked_div_u128(self, divisor: u128) -> CoreResult<U256> {
        let (quotient, _) = self.div_rem_u128(divisor)?;
        Ok(quotient)
    }

    fn leading_zeros(&self) -> u32 {
        if self.hi != 0 {
            self.hi.leading_zeros()
        } else {
            128 + self.lo.leading_zeros()
        }
    }

    fn bit(&self, index: u32) -> u128 {
        if index < 128 {
            (self.lo >> index) & 1
        } else {
            (self.hi >> (index - 128)) & 1
        }
    }

    fn set_bit(&mut self, index: u32) {
        if index < 128 {
            self.lo |= 1 << index;
        } else {
            self.hi |= 1 << (index - 128);
        }
    }
}

/// Multiply two u128 values and divide by a third with specified rounding,
/// using a 256-bit intermediate so the product never overflows
pub fn mul_div_u128(a: u128, b: u128, denominator: u128, rounding: Rounding) -> CoreResult<u128> {
    let product = U256::from_mul(a, b);
    let (quotient, remainder) = product.div_rem_u128(denominator)?;

    let mut result = quotient.to_u128().ok_or(StrataError::MathOverflow)?;
    if rounding == Rounding::Up && remainder > 0 {
        result = result.checked_add(1).ok_or(StrataError::MathOverflow)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mul_widening() {
        let product = U256::from_mul(u128::MAX, u128::MAX);
        // (2^128 - 1)^2 = 2^256 - 2^129 + 1
        assert_eq!(product.lo, 1);
        assert_eq!(product.hi, u128::MAX - 1);

        let small = U256::from_mul(100, 200);
        assert_eq!(small.to_u128().unwrap(), 20_000);
    }

    #[test]
    fn test_div_rem_wide() {
        let product = U256::from_mul(u128::MAX, 1000);
        let (q, r) = product.div_rem_u128(1000).unwrap();
        assert_eq!(q.to_u128().unwrap(), u128::MAX);
        assert_eq!(r, 0);

        let (q, r) = U256::from_mul(7, 3).div_rem_u128(5).unwrap();
        assert_eq!(q.to_u128().unwrap(), 4);
        assert_eq!(r, 1);
    }

    #[test]
    fn test_div_rem_large_divisor() {
        // Divisor near u128::MAX exercises the carry path
        let divisor = u128::MAX - 1;
        let product = U256::from_mul(divisor, 3);
        let (q, r) = product.div_rem_u128(divisor).unwrap();
        assert_eq!(q.to_u128().unwrap(), 3);
        assert_eq!(r, 0);
    }

    #[test]
    fn test_checked_mul_u128() {
        let v = U256::from_mul(u128::MAX, 2).checked_mul_u128(3).unwrap();
        let (q, r) = v.div_rem_u128(6).unwrap();
        assert_eq!(q.to_u128().unwrap(), u128::MAX);
        assert_eq!(r, 0);

        let too_big = U256::from_mul(u128::MAX, u128::MAX);
        assert_eq!(
            too_big.checked_mul_u128(u128::MAX),
            Err(StrataError::MathOverflow)
        );
    }

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div_u128(10, 3, 4, Rounding::Down).unwrap(), 7);
        assert_eq!(mul_div_u128(10, 3, 4, Rounding::Up).unwrap(), 8);
        assert_eq!(mul_div_u128(10, 4, 5, Rounding::Up).unwrap(), 8);
        assert_eq!(
            mul_div_u128(1, 1, 0, Rounding::Down),
            Err(StrataError::DivisionByZero)
        );
    }

    #[test]
    fn test_mul_div_large_numbers() {
        let a = u128::MAX / 2;
        assert_eq!(mul_div_u128(a, 2, 2, Rounding::Down).unwrap(), a);
        // Result exceeding u128 is an overflow, not a wrap
        assert_eq!(
            mul_div_u128(u128::MAX, 4, 2, Rounding::Down),
            Err(StrataError::MathOverflow)
        );
    }
}
