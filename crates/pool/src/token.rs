//! # Asset Ledgers
//!
//! In-memory token bookkeeping: total supply plus per-account balances with
//! checked mint/burn/transfer. The bond token wraps a plain token and
//! settles the affected holders' coupon accrual before any balance change,
//! always with the balance held up to that moment.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use strata_core::errors::{CoreResult, StrataError};
use strata_core::math::decimal::check_decimals;
use strata_core::math::safe_math::safe_add_u128;
use strata_core::types::{AccountId, AssetId};

use crate::auth::RolePolicy;
use crate::ledger::ShareLedger;

/// A fungible asset ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    asset: AssetId,
    decimals: u8,
    total_supply: u128,
    balances: HashMap<AccountId, u128>,
}

impl Token {
    pub fn new(asset: AssetId, decimals: u8) -> CoreResult<Self> {
        check_decimals(decimals)?;
        Ok(Self {
            asset,
            decimals,
            total_supply: 0,
            balances: HashMap::new(),
        })
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Verify a mint would succeed without performing it. Used by callers
    /// that must not fail after earlier mutations have committed.
    pub fn check_mint(&self, to: &AccountId, amount: u128) -> CoreResult<()> {
        safe_add_u128(self.total_supply, amount)?;
        safe_add_u128(self.balance_of(to), amount)?;
        Ok(())
    }

    pub fn mint(&mut self, to: AccountId, amount: u128) -> CoreResult<()> {
        self.check_mint(&to, amount)?;
        self.total_supply += amount;
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }

    pub fn burn(&mut self, from: &AccountId, amount: u128) -> CoreResult<()> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(StrataError::InsufficientBalance);
        }
        self.balances.insert(*from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    pub fn transfer(&mut self, from: &AccountId, to: AccountId, amount: u128) -> CoreResult<()> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(StrataError::InsufficientBalance);
        }
        safe_add_u128(self.balance_of(&to), amount)?;
        self.balances.insert(*from, from_balance - amount);
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

/// The bond asset: a token whose balance changes drive coupon accrual.
/// Every mint, burn, or transfer settles the affected holders first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondToken {
    token: Token,
    ledger: ShareLedger,
}

impl BondToken {
    pub fn new(asset: AssetId, decimals: u8, initial_rate: u128) -> CoreResult<Self> {
        let token = Token::new(asset, decimals)?;
        let ledger = ShareLedger::new(decimals, initial_rate);
        Ok(Self { token, ledger })
    }

    pub fn asset(&self) -> &AssetId {
        self.token.asset()
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    pub fn total_supply(&self) -> u128 {
        self.token.total_supply()
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.token.balance_of(account)
    }

    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    pub fn check_mint(&self, to: &AccountId, amount: u128) -> CoreResult<()> {
        self.token.check_mint(to, amount)
    }

    pub fn mint(&mut self, to: AccountId, amount: u128) -> CoreResult<()> {
        self.ledger.settle(to, self.token.balance_of(&to))?;
        self.token.mint(to, amount)
    }

    pub fn burn(&mut self, from: &AccountId, amount: u128) -> CoreResult<()> {
        self.ledger.settle(*from, self.token.balance_of(from))?;
        self.token.burn(from, amount)
    }

    pub fn transfer(&mut self, from: &AccountId, to: AccountId, amount: u128) -> CoreResult<()> {
        self.ledger.settle(*from, self.token.balance_of(from))?;
        self.ledger.settle(to, self.token.balance_of(&to))?;
        self.token.transfer(from, to, amount)
    }

    /// Close the running coupon period. Records the bond supply as of now.
    pub fn advance_period(
        &mut self,
        policy: &dyn RolePolicy,
        caller: &AccountId,
        new_rate: u128,
    ) -> CoreResult<()> {
        let supply = self.token.total_supply();
        self.ledger.advance_period(policy, caller, supply, new_rate)
    }

    pub fn reset_accrual(
        &mut self,
        policy: &dyn RolePolicy,
        caller: &AccountId,
        holder: AccountId,
    ) -> CoreResult<()> {
        self.ledger.reset_accrual(policy, caller, holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, StaticRoles};

    fn usdc() -> AssetId {
        AssetId::new("USDC")
    }

    #[test]
    fn test_mint_burn_transfer() {
        let alice = AccountId::from_seed(1);
        let bob = AccountId::from_seed(2);

        let mut token = Token::new(usdc(), 6).unwrap();
        token.mint(alice, 1_000).unwrap();
        assert_eq!(token.total_supply(), 1_000);
        assert_eq!(token.balance_of(&alice), 1_000);

        token.transfer(&alice, bob, 400).unwrap();
        assert_eq!(token.balance_of(&alice), 600);
        assert_eq!(token.balance_of(&bob), 400);

        token.burn(&bob, 400).unwrap();
        assert_eq!(token.total_supply(), 600);
        assert_eq!(token.balance_of(&bob), 0);
    }

    #[test]
    fn test_insufficient_balance() {
        let alice = AccountId::from_seed(1);
        let bob = AccountId::from_seed(2);

        let mut token = Token::new(usdc(), 6).unwrap();
        token.mint(alice, 100).unwrap();

        assert_eq!(
            token.transfer(&alice, bob, 101),
            Err(StrataError::InsufficientBalance)
        );
        assert_eq!(token.burn(&alice, 101), Err(StrataError::InsufficientBalance));
        // Failed attempts left nothing behind
        assert_eq!(token.balance_of(&alice), 100);
        assert_eq!(token.total_supply(), 100);
    }

    #[test]
    fn test_rejects_excess_decimals() {
        assert_eq!(
            Token::new(usdc(), 19).err(),
            Some(StrataError::InvalidParameter)
        );
    }

    #[test]
    fn test_bond_hooks_settle_with_pre_change_balance() {
        let gov = AccountId::from_seed(1);
        let alice = AccountId::from_seed(10);
        let bob = AccountId::from_seed(11);
        let mut roles = StaticRoles::new();
        roles.grant(Role::Governance, gov);

        // Two-decimal bond, 1.0 share per bond per period
        let mut bond = BondToken::new(AssetId::new("BOND"), 2, 1_000_000).unwrap();
        bond.mint(alice, 500).unwrap(); // 5.00 bonds in period 0

        bond.advance_period(&roles, &gov, 1_000_000).unwrap();

        // The mint settles alice with her 5.00-bond period-0 balance before
        // adding more
        bond.mint(alice, 300).unwrap();
        assert_eq!(bond.ledger().accrued_shares(&alice), 5_000_000);

        bond.advance_period(&roles, &gov, 1_000_000).unwrap();

        // Transfer settles both sides with pre-transfer balances
        bond.transfer(&alice, bob, 800).unwrap();
        assert_eq!(bond.ledger().accrued_shares(&alice), 13_000_000); // 5 + 8
        assert_eq!(bond.ledger().accrued_shares(&bob), 0);

        bond.advance_period(&roles, &gov, 1_000_000).unwrap();

        bond.burn(&bob, 800).unwrap();
        assert_eq!(bond.ledger().accrued_shares(&bob), 8_000_000);
        assert_eq!(bond.total_supply(), 0);
    }

    #[test]
    fn test_advance_records_current_supply() {
        let gov = AccountId::from_seed(1);
        let mut roles = StaticRoles::new();
        roles.grant(Role::Governance, gov);

        let mut bond = BondToken::new(AssetId::new("BOND"), 2, 0).unwrap();
        bond.mint(AccountId::from_seed(10), 1_234).unwrap();
        bond.advance_period(&roles, &gov, 0).unwrap();

        assert_eq!(bond.ledger().snapshots()[0].total_bond_supply, 1_234);
    }
}
