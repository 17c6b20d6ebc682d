//! # Share Ledger
//!
//! Period-indexed coupon accrual. A global period counter advances once per
//! distribution; each past period is recorded in an append-only snapshot
//! table. Holders are settled lazily: the first balance-affecting event
//! after any number of skipped periods catches them up in O(1) using a
//! cumulative-rate table (`cum[p]` is the sum of all rates before period
//! `p`), so a holder's span entitlement is
//! `balance * (cum[current] - cum[last_settled])`.
//!
//! Accrual is carried at full precision (bond-balance digits plus rate
//! digits) and rescaled to the canonical six-decimal share unit on read.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use strata_core::errors::{CoreResult, StrataError};
use strata_core::math::decimal::pow10;
use strata_core::math::safe_math::{safe_add_u128, safe_mul_u128};
use strata_core::types::AccountId;

use crate::auth::{ensure_role, Role, RolePolicy};

/// State that was active during one completed period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub period: u32,
    pub total_bond_supply: u128,
    /// Shares (six decimals) accrued per whole bond unit over the period
    pub rate: u128,
}

/// Per-holder lazy accrual state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct HolderAccrual {
    last_settled_period: u32,
    /// Full-precision accrual (balance digits + rate digits)
    accrued_raw: u128,
}

/// The period ledger for one bond asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLedger {
    current_period: u32,
    /// Rate for the running period; snapshotted when the period ends
    current_rate: u128,
    /// Append-only, one entry per completed period
    snapshots: Vec<PeriodSnapshot>,
    /// cum[p] = sum of rates of all periods before p; len = current + 1
    cumulative: Vec<u128>,
    holders: HashMap<AccountId, HolderAccrual>,
    /// Fractional digits of the bond asset, divided out when raw accrual is
    /// rescaled to whole-bond share units
    bond_decimals: u8,
}

impl ShareLedger {
    pub fn new(bond_decimals: u8, initial_rate: u128) -> Self {
        Self {
            current_period: 0,
            current_rate: initial_rate,
            snapshots: Vec::new(),
            cumulative: vec![0],
            holders: HashMap::new(),
            bond_decimals,
        }
    }

    pub fn current_period(&self) -> u32 {
        self.current_period
    }

    pub fn current_rate(&self) -> u128 {
        self.current_rate
    }

    pub fn snapshots(&self) -> &[PeriodSnapshot] {
        &self.snapshots
    }

    /// Catch a holder up to the current period. `balance_before_change` is
    /// the balance held for the span that ends now, captured before the
    /// triggering mint/burn/transfer mutates it.
    pub fn settle(&mut self, holder: AccountId, balance_before_change: u128) -> CoreResult<()> {
        let span_rate = self.span_rate(self.holders.get(&holder));
        let entry = self.holders.entry(holder).or_default();
        entry.accrued_raw = safe_add_u128(
            entry.accrued_raw,
            safe_mul_u128(balance_before_change, span_rate)?,
        )?;
        entry.last_settled_period = self.current_period;
        Ok(())
    }

    /// What `settle` would leave as the holder's total accrued shares,
    /// without committing. Identical inputs and state give identical
    /// values.
    pub fn peek(&self, holder: &AccountId, balance: u128) -> CoreResult<u128> {
        let entry = self.holders.get(holder);
        let span_rate = self.span_rate(entry);
        let base = entry.map(|e| e.accrued_raw).unwrap_or(0);
        let raw = safe_add_u128(base, safe_mul_u128(balance, span_rate)?)?;
        Ok(raw / pow10(self.bond_decimals))
    }

    /// Committed accrual in six-decimal share units
    pub fn accrued_shares(&self, holder: &AccountId) -> u128 {
        self.holders
            .get(holder)
            .map(|e| e.accrued_raw / pow10(self.bond_decimals))
            .unwrap_or(0)
    }

    /// Close the running period: snapshot it with the outgoing rate and the
    /// supplied total supply, then open the next period at `new_rate`.
    pub fn advance_period(
        &mut self,
        policy: &dyn RolePolicy,
        caller: &AccountId,
        total_bond_supply: u128,
        new_rate: u128,
    ) -> CoreResult<()> {
        ensure_role(policy, Role::Governance, caller)?;

        // Validate the cumulative extension before touching anything so the
        // advance commits fully or not at all
        let last = *self.cumulative.last().unwrap_or(&0);
        let next_cumulative = safe_add_u128(last, self.current_rate)?;

        self.snapshots.push(PeriodSnapshot {
            period: self.current_period,
            total_bond_supply,
            rate: self.current_rate,
        });
        self.cumulative.push(next_cumulative);
        self.current_period += 1;
        self.current_rate = new_rate;

        debug_assert_eq!(self.snapshots.len(), self.current_period as usize);
        Ok(())
    }

    /// Zero a holder's accrual after an external claim has paid it out
    pub fn reset_accrual(
        &mut self,
        policy: &dyn RolePolicy,
        caller: &AccountId,
        holder: AccountId,
    ) -> CoreResult<()> {
        ensure_role(policy, Role::Distributor, caller)?;
        self.holders.insert(
            holder,
            HolderAccrual {
                last_settled_period: self.current_period,
                accrued_raw: 0,
            },
        );
        Ok(())
    }

    /// Sum of rates over the holder's unsettled span. Only completed
    /// periods are covered; the cumulative table never exposes a future
    /// snapshot.
    fn span_rate(&self, entry: Option<&HolderAccrual>) -> u128 {
        let from = entry.map(|e| e.last_settled_period).unwrap_or(0) as usize;
        self.cumulative[self.current_period as usize] - self.cumulative[from]
    }
}
