//! # Bond Registry
//!
//! Tracks preconfer collateral. A participant is active while its bonded
//! collateral is at least the configured minimum.
//!
//! ## Slashing
//!
//! [`BondRegistry::slash`] is the only path that moves collateral without
//! the owner's consent. It requires the [`SlashCapability`] minted alongside
//! the registry; any other capability is refused. The seized amount is
//! capped at the target's balance and credited to the treasury.

use std::collections::BTreeMap;

use raid_core::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Authority to slash collateral in one specific [`BondRegistry`].
///
/// Not `Clone`: there is exactly one per registry, and it lives inside the
/// head state machine.
#[derive(Debug)]
pub struct SlashCapability {
    id: Uuid,
}

/// One executed slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashRecord {
    /// The slashed participant.
    pub identity: Address,
    /// Amount the slasher asked for.
    pub requested: u128,
    /// Amount actually seized (capped at the balance).
    pub seized: u128,
    /// Human-readable reason.
    pub reason: String,
    /// When the slash happened.
    pub at: Timestamp,
}

/// Bond registry failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BondError {
    /// Deposits and withdrawals must move a positive amount.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Withdrawal exceeds the bonded balance.
    #[error("insufficient collateral: requested {requested}, available {available}")]
    InsufficientCollateral {
        /// Amount asked for.
        requested: u128,
        /// Bonded balance.
        available: u128,
    },

    /// The capability presented was not minted by this registry.
    #[error("slash capability not recognized by this registry")]
    UnauthorizedSlasher,

    /// Balance arithmetic overflowed.
    #[error("collateral overflow")]
    Overflow,
}

/// Collateral ledger for preconfers.
#[derive(Debug, Clone)]
pub struct BondRegistry {
    collateral: BTreeMap<Address, u128>,
    min_collateral: u128,
    treasury: Address,
    treasury_balance: u128,
    slasher: Uuid,
    history: Vec<SlashRecord>,
}

impl BondRegistry {
    /// Create a registry and the single capability allowed to slash it.
    pub fn new(min_collateral: u128, treasury: Address) -> (Self, SlashCapability) {
        let id = Uuid::new_v4();
        let registry = Self {
            collateral: BTreeMap::new(),
            min_collateral,
            treasury,
            treasury_balance: 0,
            slasher: id,
            history: Vec::new(),
        };
        (registry, SlashCapability { id })
    }

    /// Add collateral. Returns the new balance.
    pub fn deposit(&mut self, identity: Address, amount: u128) -> Result<u128, BondError> {
        if amount == 0 {
            return Err(BondError::ZeroAmount);
        }
        let balance = self.collateral.entry(identity).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(BondError::Overflow)?;
        tracing::debug!(%identity, amount, balance = *balance, "collateral deposited");
        Ok(*balance)
    }

    /// Remove collateral. Returns the new balance.
    pub fn withdraw(&mut self, identity: Address, amount: u128) -> Result<u128, BondError> {
        if amount == 0 {
            return Err(BondError::ZeroAmount);
        }
        let available = self.collateral_of(identity);
        if amount > available {
            return Err(BondError::InsufficientCollateral {
                requested: amount,
                available,
            });
        }
        let balance = available - amount;
        self.set_balance(identity, balance);
        tracing::debug!(%identity, amount, balance, "collateral withdrawn");
        Ok(balance)
    }

    /// Seize up to `amount` from `identity` into the treasury.
    ///
    /// Returns the amount actually seized, which may be zero.
    pub fn slash(
        &mut self,
        capability: &SlashCapability,
        identity: Address,
        amount: u128,
        reason: impl Into<String>,
        at: Timestamp,
    ) -> Result<u128, BondError> {
        if capability.id != self.slasher {
            return Err(BondError::UnauthorizedSlasher);
        }
        let available = self.collateral_of(identity);
        let seized = amount.min(available);
        let treasury_balance = self
            .treasury_balance
            .checked_add(seized)
            .ok_or(BondError::Overflow)?;
        self.set_balance(identity, available - seized);
        self.treasury_balance = treasury_balance;

        let reason = reason.into();
        tracing::warn!(%identity, requested = amount, seized, %reason, "participant slashed");
        self.history.push(SlashRecord {
            identity,
            requested: amount,
            seized,
            reason,
            at,
        });
        Ok(seized)
    }

    /// Whether `identity` meets the collateral minimum.
    pub fn is_active(&self, identity: Address) -> bool {
        let balance = self.collateral_of(identity);
        balance > 0 && balance >= self.min_collateral
    }

    /// Bonded balance of `identity`.
    pub fn collateral_of(&self, identity: Address) -> u128 {
        self.collateral.get(&identity).copied().unwrap_or(0)
    }

    /// Participants with a non-zero balance, in address order.
    pub fn participants(&self) -> impl Iterator<Item = (Address, u128)> + '_ {
        self.collateral.iter().map(|(a, b)| (*a, *b))
    }

    /// The treasury identity that receives seized collateral.
    pub fn treasury(&self) -> Address {
        self.treasury
    }

    /// Total seized collateral held by the treasury.
    pub fn treasury_balance(&self) -> u128 {
        self.treasury_balance
    }

    /// Configured collateral minimum.
    pub fn min_collateral(&self) -> u128 {
        self.min_collateral
    }

    /// All slashes executed so far, oldest first.
    pub fn slash_history(&self) -> &[SlashRecord] {
        &self.history
    }

    fn set_balance(&mut self, identity: Address, balance: u128) {
        if balance == 0 {
            self.collateral.remove(&identity);
        } else {
            self.collateral.insert(identity, balance);
        }
    }
}
