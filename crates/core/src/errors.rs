//! # Error Taxonomy
//!
//! Single error enum shared by the pure math layer and the stateful pool.
//! Every failure aborts the whole call; there is no local recovery.

use thiserror::Error;

/// Protocol errors, grouped by the taxonomy of the failure
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StrataError {
    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Amount is zero")]
    ZeroAmount,

    #[error("Amount below minimum: got {got}, minimum {min}")]
    MinAmount { got: u128, min: u128 },

    #[error("Invalid parameter")]
    InvalidParameter,

    // ========================================================================
    // State Errors
    // ========================================================================

    #[error("Bond supply is zero")]
    ZeroDebtSupply,

    #[error("Leverage supply is zero")]
    ZeroLeverageSupply,

    #[error("Distribution period has not elapsed")]
    DistributionPeriod,

    #[error("Pool is paused")]
    Paused,

    #[error("Reentrant call")]
    Reentrancy,

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Access denied")]
    AccessDenied,

    // ========================================================================
    // Timing Errors
    // ========================================================================

    #[error("Transaction deadline exceeded")]
    TransactionTooOld,

    // ========================================================================
    // Oracle Errors
    // ========================================================================

    #[error("No price feed found")]
    NoFeedFound,

    #[error("Price feed is stale")]
    StalePrice,

    // ========================================================================
    // Transfer Errors
    // ========================================================================

    #[error("Insufficient balance")]
    InsufficientBalance,

    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Conversion error")]
    ConversionError,
}

/// Result type using protocol errors
pub type CoreResult<T> = Result<T, StrataError>;

impl StrataError {
    /// Create a slippage error
    pub fn min_amount(got: u128, min: u128) -> Self {
        Self::MinAmount { got, min }
    }
}
