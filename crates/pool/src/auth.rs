//! # Role Policy
//!
//! Permission checks are an explicit capability object handed to the pool
//! and ledger, not ambient global state, so the core stays testable in
//! isolation from any permission subsystem.

use std::collections::{HashMap, HashSet};

use strata_core::errors::{CoreResult, StrataError};
use strata_core::types::AccountId;

/// Protocol roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Role {
    /// Parameter setters, pause control, and period advancement
    Governance,
    /// Claim settlement: may reset a holder's accrued shares after payout
    Distributor,
}

/// Capability seam consulted for every gated operation
pub trait RolePolicy {
    fn has_role(&self, role: Role, account: &AccountId) -> bool;
}

/// Fail with `AccessDenied` unless the account holds the role
pub fn ensure_role(policy: &dyn RolePolicy, role: Role, account: &AccountId) -> CoreResult<()> {
    if policy.has_role(role, account) {
        Ok(())
    } else {
        Err(StrataError::AccessDenied)
    }
}

/// In-memory role table
#[derive(Debug, Clone, Default)]
pub struct StaticRoles {
    grants: HashMap<Role, HashSet<AccountId>>,
}

impl StaticRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, role: Role, account: AccountId) {
        self.grants.entry(role).or_default().insert(account);
    }

    pub fn revoke(&mut self, role: Role, account: &AccountId) {
        if let Some(accounts) = self.grants.get_mut(&role) {
            accounts.remove(account);
        }
    }
}

impl RolePolicy for StaticRoles {
    fn has_role(&self, role: Role, account: &AccountId) -> bool {
        self.grants
            .get(&role)
            .map(|accounts| accounts.contains(account))
            .unwrap_or(false)
    }
}
