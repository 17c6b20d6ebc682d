//! # Pool Events
//!
//! Typed records of every state change, appended to the pool's event log
//! and mirrored to the `tracing` subscriber.

use serde::{Deserialize, Serialize};

use strata_core::types::{AccountId, TokenKind};

/// Emitted record of a pool state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    Created {
        caller: AccountId,
        recipient: AccountId,
        kind: TokenKind,
        deposit_amount: u128,
        minted_amount: u128,
    },
    Redeemed {
        caller: AccountId,
        recipient: AccountId,
        kind: TokenKind,
        deposit_amount: u128,
        reserve_amount: u128,
    },
    Swapped {
        caller: AccountId,
        recipient: AccountId,
        kind: TokenKind,
        deposit_amount: u128,
        minted_amount: u128,
    },
    Distributed {
        period: u32,
        amount: u128,
    },
    FeeChanged {
        fee: u128,
    },
    DistributionPeriodChanged {
        period_seconds: i64,
    },
    SharesPerTokenChanged {
        rate: u128,
    },
    FeesClaimed {
        beneficiary: AccountId,
        amount: u128,
    },
    Paused,
    Unpaused,
}

pub(crate) fn emit(event: &PoolEvent) {
    tracing::info!(event = ?event, "pool event");
}
