//! # Pricing Engine
//!
//! The pool orchestrates create/redeem/swap/distribute over the pure
//! pricing formulas, consulting the oracle for the reserve price and
//! driving the share ledger's period advancement.
//!
//! Every state-mutating operation validates completely before the first
//! mutation (validate-then-commit), holds the reentrancy lock for its full
//! duration, and honors the caller's optional deadline. While paused, every
//! mutating entry point fails uniformly with `Paused`.

use strata_core::constants::{MAX_FEE, PRECISION, SECONDS_PER_YEAR, SHARES_DECIMALS};
use strata_core::errors::{CoreResult, StrataError};
use strata_core::math::big_int::{mul_div_u128, Rounding, U256};
use strata_core::math::decimal::{from_common, pow10, rescale, to_common};
use strata_core::math::safe_math::{safe_add_u128, safe_sub_u128};
use strata_core::pricing;
use strata_core::types::{AccountId, AssetId, TokenKind};

use crate::auth::{ensure_role, Role, RolePolicy};
use crate::events::{emit, PoolEvent};
use crate::guard::{check_deadline, ReentrancyFlag};
use crate::oracle::PriceOracle;
use crate::token::{BondToken, Token};

/// External venue coupons are forwarded to. Notification only; the coupon
/// asset itself moves to the sink account before this is called.
pub trait DistributionSink {
    fn allocate(&mut self, pool: &AccountId, amount: u128);
}

/// Per-call metadata for state-mutating operations
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub caller: AccountId,
    pub now: i64,
    pub deadline: Option<i64>,
    pub recipient: Option<AccountId>,
}

impl CallContext {
    pub fn new(caller: AccountId, now: i64) -> Self {
        Self {
            caller,
            now,
            deadline: None,
            recipient: None,
        }
    }

    pub fn with_deadline(mut self, deadline: i64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_recipient(mut self, recipient: AccountId) -> Self {
        self.recipient = Some(recipient);
        self
    }
}

/// Economic parameters fixed at pool construction (later adjustable through
/// the governance setters)
#[derive(Debug, Clone)]
pub struct PoolParams {
    /// Annual reserve fee, PRECISION scale
    pub fee: u128,
    pub fee_beneficiary: AccountId,
    /// Seconds between coupon distributions
    pub distribution_period: i64,
    /// Shares (six decimals) accrued per whole bond unit per period
    pub shares_per_token: u128,
}

/// Read-only pool snapshot
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PoolInfo {
    pub fee: u128,
    pub reserve: u128,
    pub bond_supply: u128,
    pub leverage_supply: u128,
    pub rate: u128,
    pub period: u32,
    pub last_distribution: i64,
    pub distribution_period: i64,
}

/// A tranche pool: reserve vault, the two claims it issues, and the coupon
/// asset it distributes.
///
/// The pool account (`id`) must hold the `Governance` role in `policy` so
/// the engine can drive the ledger's period advancement.
pub struct Pool {
    id: AccountId,
    unit_of_account: AssetId,
    reserve: Token,
    bond: BondToken,
    leverage: Token,
    coupon: Token,
    sink_account: AccountId,

    fee: u128,
    fee_beneficiary: AccountId,
    /// Settled but unclaimed fees, native reserve units
    accrued_fees: u128,
    last_fee_accrual: i64,

    distribution_period: i64,
    last_distribution: i64,
    shares_per_token: u128,

    paused: bool,
    lock: ReentrancyFlag,

    oracle: Box<dyn PriceOracle>,
    policy: Box<dyn RolePolicy>,
    sink: Box<dyn DistributionSink>,

    events: Vec<PoolEvent>,
}

impl Pool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AccountId,
        reserve: Token,
        bond: BondToken,
        leverage: Token,
        coupon: Token,
        unit_of_account: AssetId,
        sink_account: AccountId,
        params: PoolParams,
        oracle: Box<dyn PriceOracle>,
        policy: Box<dyn RolePolicy>,
        sink: Box<dyn DistributionSink>,
        now: i64,
    ) -> CoreResult<Self> {
        if params.fee >= MAX_FEE || params.distribution_period <= 0 {
            return Err(StrataError::InvalidParameter);
        }
        Ok(Self {
            id,
            unit_of_account,
            reserve,
            bond,
            leverage,
            coupon,
            sink_account,
            fee: params.fee,
            fee_beneficiary: params.fee_beneficiary,
            accrued_fees: 0,
            last_fee_accrual: now,
            distribution_period: params.distribution_period,
            last_distribution: now,
            shares_per_token: params.shares_per_token,
            paused: false,
            lock: ReentrancyFlag::default(),
            oracle,
            policy,
            sink,
            events: Vec::new(),
        })
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Deposit reserve, mint `kind` to the recipient (default: caller)
    pub fn create(
        &mut self,
        kind: TokenKind,
        deposit_amount: u128,
        min_amount: u128,
        ctx: &CallContext,
    ) -> CoreResult<u128> {
        self.with_lock(|pool| {
            pool.ensure_unpaused()?;
            check_deadline(ctx.deadline, ctx.now)?;
            if deposit_amount == 0 {
                return Err(StrataError::ZeroAmount);
            }
            if pool.reserve.balance_of(&ctx.caller) < deposit_amount {
                return Err(StrataError::InsufficientBalance);
            }

            let minted = pool.quote_create(kind, deposit_amount, ctx.now)?;
            if minted == 0 {
                return Err(StrataError::ZeroAmount);
            }
            if minted < min_amount {
                return Err(StrataError::min_amount(minted, min_amount));
            }

            let recipient = ctx.recipient.unwrap_or(ctx.caller);
            match kind {
                TokenKind::Bond => pool.bond.check_mint(&recipient, minted)?,
                TokenKind::Leverage => pool.leverage.check_mint(&recipient, minted)?,
            }

            // Commit
            let pool_id = pool.id;
            match kind {
                TokenKind::Bond => pool.bond.mint(recipient, minted)?,
                TokenKind::Leverage => pool.leverage.mint(recipient, minted)?,
            }
            pool.reserve.transfer(&ctx.caller, pool_id, deposit_amount)?;

            pool.record(PoolEvent::Created {
                caller: ctx.caller,
                recipient,
                kind,
                deposit_amount,
                minted_amount: minted,
            });
            Ok(minted)
        })
    }

    /// Burn `kind` from the caller, pay out reserve to the recipient
    pub fn redeem(
        &mut self,
        kind: TokenKind,
        deposit_amount: u128,
        min_amount: u128,
        ctx: &CallContext,
    ) -> CoreResult<u128> {
        self.with_lock(|pool| {
            pool.ensure_unpaused()?;
            check_deadline(ctx.deadline, ctx.now)?;
            if deposit_amount == 0 {
                return Err(StrataError::ZeroAmount);
            }
            let holding = match kind {
                TokenKind::Bond => pool.bond.balance_of(&ctx.caller),
                TokenKind::Leverage => pool.leverage.balance_of(&ctx.caller),
            };
            if holding < deposit_amount {
                return Err(StrataError::InsufficientBalance);
            }

            let reserve_out = pool.quote_redeem(kind, deposit_amount, ctx.now)?;
            if reserve_out == 0 {
                return Err(StrataError::ZeroAmount);
            }
            if reserve_out < min_amount {
                return Err(StrataError::min_amount(reserve_out, min_amount));
            }
            if pool.reserve.balance_of(&pool.id) < reserve_out {
                return Err(StrataError::InsufficientBalance);
            }

            // Commit
            let recipient = ctx.recipient.unwrap_or(ctx.caller);
            let pool_id = pool.id;
            match kind {
                TokenKind::Bond => pool.bond.burn(&ctx.caller, deposit_amount)?,
                TokenKind::Leverage => pool.leverage.burn(&ctx.caller, deposit_amount)?,
            }
            pool.reserve.transfer(&pool_id, recipient, reserve_out)?;

            pool.record(PoolEvent::Redeemed {
                caller: ctx.caller,
                recipient,
                kind,
                deposit_amount,
                reserve_amount: reserve_out,
            });
            Ok(reserve_out)
        })
    }

    /// Burn `kind`, mint the opposite kind priced as an atomic
    /// redeem-then-create; no reserve moves
    pub fn swap(
        &mut self,
        kind: TokenKind,
        deposit_amount: u128,
        min_amount: u128,
        ctx: &CallContext,
    ) -> CoreResult<u128> {
        self.with_lock(|pool| {
            pool.ensure_unpaused()?;
            check_deadline(ctx.deadline, ctx.now)?;
            if deposit_amount == 0 {
                return Err(StrataError::ZeroAmount);
            }
            let holding = match kind {
                TokenKind::Bond => pool.bond.balance_of(&ctx.caller),
                TokenKind::Leverage => pool.leverage.balance_of(&ctx.caller),
            };
            if holding < deposit_amount {
                return Err(StrataError::InsufficientBalance);
            }

            let minted = pool.quote_swap(kind, deposit_amount, ctx.now)?;
            if minted == 0 {
                return Err(StrataError::ZeroAmount);
            }
            if minted < min_amount {
                return Err(StrataError::min_amount(minted, min_amount));
            }

            let recipient = ctx.recipient.unwrap_or(ctx.caller);
            match kind.opposite() {
                TokenKind::Bond => pool.bond.check_mint(&recipient, minted)?,
                TokenKind::Leverage => pool.leverage.check_mint(&recipient, minted)?,
            }

            // Commit
            match kind {
                TokenKind::Bond => {
                    pool.bond.burn(&ctx.caller, deposit_amount)?;
                    pool.leverage.mint(recipient, minted)?;
                }
                TokenKind::Leverage => {
                    pool.leverage.burn(&ctx.caller, deposit_amount)?;
                    pool.bond.mint(recipient, minted)?;
                }
            }

            pool.record(PoolEvent::Swapped {
                caller: ctx.caller,
                recipient,
                kind,
                deposit_amount,
                minted_amount: minted,
            });
            Ok(minted)
        })
    }

    /// Pay the period coupon to the distribution sink and open the next
    /// accrual period. Fails `DistributionPeriod` until the period has
    /// elapsed; an insufficient coupon balance aborts with no state change.
    pub fn distribute(&mut self, ctx: &CallContext) -> CoreResult<()> {
        self.with_lock(|pool| {
            pool.ensure_unpaused()?;
            if ctx.now - pool.last_distribution < pool.distribution_period {
                return Err(StrataError::DistributionPeriod);
            }

            let amount = pool.coupon_amount_owed()?;
            if pool.coupon.balance_of(&pool.id) < amount {
                return Err(StrataError::InsufficientBalance);
            }
            safe_add_u128(pool.coupon.balance_of(&pool.sink_account), amount)?;
            // The engine itself drives the ledger; fail up front if it was
            // wired without the role rather than after mutating
            ensure_role(&*pool.policy, Role::Governance, &pool.id)?;

            // Commit; the timestamp moves before the external transfer so a
            // reentrant distribute cannot pay twice
            let period = pool.bond.ledger().current_period();
            let pool_id = pool.id;
            let incoming_rate = pool.shares_per_token;
            pool.bond.advance_period(&*pool.policy, &pool_id, incoming_rate)?;
            pool.last_distribution = ctx.now + pool.distribution_period;

            if amount > 0 {
                pool.coupon.transfer(&pool_id, pool.sink_account, amount)?;
                pool.sink.allocate(&pool_id, amount);
            }

            pool.record(PoolEvent::Distributed { period, amount });
            Ok(())
        })
    }

    /// Pay accumulated protocol fees to the beneficiary
    pub fn claim_fees(&mut self, ctx: &CallContext) -> CoreResult<u128> {
        self.with_lock(|pool| {
            pool.ensure_unpaused()?;
            if ctx.caller != pool.fee_beneficiary {
                return Err(StrataError::AccessDenied);
            }
            let amount = pool.total_accrued_fees(ctx.now)?;
            if pool.reserve.balance_of(&pool.id) < amount {
                return Err(StrataError::InsufficientBalance);
            }

            let pool_id = pool.id;
            let beneficiary = pool.fee_beneficiary;
            pool.accrued_fees = 0;
            pool.last_fee_accrual = ctx.now;
            if amount > 0 {
                pool.reserve.transfer(&pool_id, beneficiary, amount)?;
            }

            pool.record(PoolEvent::FeesClaimed {
                beneficiary,
                amount,
            });
            Ok(amount)
        })
    }

    /// Zero a holder's accrued shares after an external claim has paid
    /// them out. Gated to the `Distributor` role.
    pub fn reset_accrual(&mut self, holder: AccountId, ctx: &CallContext) -> CoreResult<()> {
        self.bond
            .reset_accrual(&*self.policy, &ctx.caller, holder)
    }

    // ========================================================================
    // Quoting (read-only simulation)
    // ========================================================================

    /// Simulate `create` without touching state
    pub fn quote_create(&self, kind: TokenKind, deposit_amount: u128, now: i64) -> CoreResult<u128> {
        let (price, price_decimals) = self.reserve_price(now)?;
        let deposit = to_common(deposit_amount, self.reserve.decimals())?;
        let (bond_supply, lev_supply, reserves) = self.common_state(now)?;
        let minted = pricing::create_amount(
            kind,
            deposit,
            bond_supply,
            lev_supply,
            reserves,
            price,
            price_decimals,
        )?;
        from_common(minted, self.target_decimals(kind))
    }

    /// Simulate `redeem` without touching state
    pub fn quote_redeem(&self, kind: TokenKind, deposit_amount: u128, now: i64) -> CoreResult<u128> {
        let (price, price_decimals) = self.reserve_price(now)?;
        let deposit = to_common(deposit_amount, self.target_decimals(kind))?;
        let (bond_supply, lev_supply, reserves) = self.common_state(now)?;
        let out = pricing::redeem_amount(
            kind,
            deposit,
            bond_supply,
            lev_supply,
            reserves,
            price,
            price_decimals,
        )?;
        from_common(out, self.reserve.decimals())
    }

    /// Simulate `swap` without touching state
    pub fn quote_swap(&self, kind: TokenKind, deposit_amount: u128, now: i64) -> CoreResult<u128> {
        let (price, price_decimals) = self.reserve_price(now)?;
        let deposit = to_common(deposit_amount, self.target_decimals(kind))?;
        let (bond_supply, lev_supply, reserves) = self.common_state(now)?;
        let minted = pricing::swap_amount(
            kind,
            deposit,
            bond_supply,
            lev_supply,
            reserves,
            price,
            price_decimals,
        )?;
        from_common(minted, self.target_decimals(kind.opposite()))
    }

    // ========================================================================
    // Governance
    // ========================================================================

    pub fn set_fee(&mut self, fee: u128, ctx: &CallContext) -> CoreResult<()> {
        self.ensure_unpaused()?;
        ensure_role(&*self.policy, Role::Governance, &ctx.caller)?;
        if fee >= MAX_FEE {
            return Err(StrataError::InvalidParameter);
        }
        // Settle what accrued at the outgoing rate first
        self.accrued_fees = self.total_accrued_fees(ctx.now)?;
        self.last_fee_accrual = ctx.now;
        self.fee = fee;
        self.record(PoolEvent::FeeChanged { fee });
        Ok(())
    }

    pub fn set_distribution_period(&mut self, period_seconds: i64, ctx: &CallContext) -> CoreResult<()> {
        ensure_role(&*self.policy, Role::Governance, &ctx.caller)?;
        if period_seconds <= 0 {
            return Err(StrataError::InvalidParameter);
        }
        self.distribution_period = period_seconds;
        self.record(PoolEvent::DistributionPeriodChanged { period_seconds });
        Ok(())
    }

    /// Rate installed for periods opened by future distributions
    pub fn set_shares_per_token(&mut self, rate: u128, ctx: &CallContext) -> CoreResult<()> {
        ensure_role(&*self.policy, Role::Governance, &ctx.caller)?;
        self.shares_per_token = rate;
        self.record(PoolEvent::SharesPerTokenChanged { rate });
        Ok(())
    }

    pub fn pause(&mut self, ctx: &CallContext) -> CoreResult<()> {
        ensure_role(&*self.policy, Role::Governance, &ctx.caller)?;
        self.paused = true;
        self.record(PoolEvent::Paused);
        Ok(())
    }

    pub fn unpause(&mut self, ctx: &CallContext) -> CoreResult<()> {
        ensure_role(&*self.policy, Role::Governance, &ctx.caller)?;
        self.paused = false;
        self.record(PoolEvent::Unpaused);
        Ok(())
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn pool_info(&self) -> PoolInfo {
        PoolInfo {
            fee: self.fee,
            reserve: self.reserve.balance_of(&self.id),
            bond_supply: self.bond.total_supply(),
            leverage_supply: self.leverage.total_supply(),
            rate: self.bond.ledger().current_rate(),
            period: self.bond.ledger().current_period(),
            last_distribution: self.last_distribution,
            distribution_period: self.distribution_period,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn reserve_token(&self) -> &Token {
        &self.reserve
    }

    pub fn bond_token(&self) -> &BondToken {
        &self.bond
    }

    pub fn leverage_token(&self) -> &Token {
        &self.leverage
    }

    pub fn coupon_token(&self) -> &Token {
        &self.coupon
    }

    /// Fees accrued but not yet claimed, as of `now`
    pub fn total_accrued_fees(&self, now: i64) -> CoreResult<u128> {
        safe_add_u128(self.accrued_fees, self.pending_fee(now)?)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn with_lock<T>(&mut self, f: impl FnOnce(&mut Self) -> CoreResult<T>) -> CoreResult<T> {
        self.lock.acquire()?;
        let result = f(self);
        self.lock.release();
        result
    }

    fn ensure_unpaused(&self) -> CoreResult<()> {
        if self.paused {
            return Err(StrataError::Paused);
        }
        Ok(())
    }

    fn record(&mut self, event: PoolEvent) {
        emit(&event);
        self.events.push(event);
    }

    fn reserve_price(&self, now: i64) -> CoreResult<(u128, u8)> {
        let price = self
            .oracle
            .price(self.reserve.asset(), &self.unit_of_account, now)?;
        let decimals = self
            .oracle
            .price_decimals(self.reserve.asset(), &self.unit_of_account)?;
        Ok((price, decimals))
    }

    /// Supplies and fee-netted reserves in the common basis
    fn common_state(&self, now: i64) -> CoreResult<(u128, u128, u128)> {
        let bond_supply = to_common(self.bond.total_supply(), self.bond.decimals())?;
        let lev_supply = to_common(self.leverage.total_supply(), self.leverage.decimals())?;
        let reserves = to_common(self.net_reserves(now)?, self.reserve.decimals())?;
        Ok((bond_supply, lev_supply, reserves))
    }

    fn target_decimals(&self, kind: TokenKind) -> u8 {
        match kind {
            TokenKind::Bond => self.bond.decimals(),
            TokenKind::Leverage => self.leverage.decimals(),
        }
    }

    /// Pool reserves net of all accrued but unclaimed fees
    fn net_reserves(&self, now: i64) -> CoreResult<u128> {
        let balance = self.reserve.balance_of(&self.id);
        safe_sub_u128(balance, self.total_accrued_fees(now)?)
    }

    /// Fee accrued since the last settlement:
    /// balance * fee * elapsed / (PRECISION * SECONDS_PER_YEAR)
    fn pending_fee(&self, now: i64) -> CoreResult<u128> {
        if self.fee == 0 {
            return Ok(0);
        }
        let balance = self.reserve.balance_of(&self.id);
        let elapsed = now.saturating_sub(self.last_fee_accrual).max(0) as u128;
        U256::from_mul(balance, self.fee)
            .checked_mul_u128(elapsed)?
            .checked_div_u128(PRECISION)?
            .checked_div_u128(SECONDS_PER_YEAR as u128)?
            .to_u128()
            .ok_or(StrataError::MathOverflow)
    }

    /// Coupon owed for the ending period: total bond supply times the
    /// running rate, multiplied at the shared maximal precision and
    /// rescaled down to the coupon asset's native precision
    fn coupon_amount_owed(&self) -> CoreResult<u128> {
        let supply = self.bond.total_supply();
        let rate = self.bond.ledger().current_rate();
        if supply == 0 || rate == 0 {
            return Ok(0);
        }
        let bond_decimals = self.bond.decimals();
        let coupon_decimals = self.coupon.decimals();
        let max_decimals = bond_decimals.max(SHARES_DECIMALS).max(coupon_decimals);

        let supply_scaled = rescale(supply, bond_decimals, max_decimals)?;
        let rate_scaled = rescale(rate, SHARES_DECIMALS, max_decimals)?;
        mul_div_u128(
            supply_scaled,
            rate_scaled,
            pow10(2 * max_decimals - coupon_decimals),
            Rounding::Down,
        )
    }
}
