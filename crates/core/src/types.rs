//! # Core Type Definitions
//!
//! Identifiers and the tranche-kind enum shared by the pricing layer and
//! the stateful pool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two derivative claims a pool issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Senior claim with a fixed face value while the pool is healthy
    Bond,
    /// Junior claim absorbing value above or below the bond floor
    Leverage,
}

impl TokenKind {
    /// The other side of the tranche pair
    pub fn opposite(self) -> TokenKind {
        match self {
            TokenKind::Bond => TokenKind::Leverage,
            TokenKind::Leverage => TokenKind::Bond,
        }
    }
}

/// Account identifier (32 opaque bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic id from a small seed, for tests and fixtures
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Self(bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..")
    }
}

/// Asset identifier (symbolic)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(symbol: &str) -> Self {
        Self(symbol.to_string())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_kind() {
        assert_eq!(TokenKind::Bond.opposite(), TokenKind::Leverage);
        assert_eq!(TokenKind::Leverage.opposite(), TokenKind::Bond);
    }

    #[test]
    fn test_account_id_from_seed() {
        assert_eq!(AccountId::from_seed(7), AccountId::from_seed(7));
        assert_ne!(AccountId::from_seed(7), AccountId::from_seed(8));
        assert_eq!(format!("{}", AccountId::from_seed(1)), "01000000..");
    }
}
