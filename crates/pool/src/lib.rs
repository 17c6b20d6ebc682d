//! # Strata Pool - Stateful Tranche Engine
//!
//! The stateful layer of the Strata protocol:
//!
//! - [`engine::Pool`]: create/redeem/swap/distribute orchestration over the
//!   pure pricing formulas of `strata-core`
//! - [`ledger::ShareLedger`]: period-indexed, lazily-settled coupon accrual
//! - [`token`]: in-memory asset ledgers, including the bond token whose
//!   balance changes drive accrual settlement
//! - Collaborator seams: [`oracle::PriceOracle`], [`auth::RolePolicy`],
//!   [`engine::DistributionSink`]
//!
//! Calls are strictly serialized; every operation either commits fully or
//! leaves no trace (validate-then-commit plus an explicit reentrancy lock).

pub mod auth;
pub mod engine;
pub mod events;
pub mod guard;
pub mod ledger;
pub mod oracle;
pub mod token;

pub use auth::{Role, RolePolicy, StaticRoles};
pub use engine::{CallContext, DistributionSink, Pool, PoolInfo, PoolParams};
pub use events::PoolEvent;
pub use ledger::{PeriodSnapshot, ShareLedger};
pub use oracle::{FeedRegistry, PriceFeed, PriceOracle};
pub use token::{BondToken, Token};
