//! Token ledger seam.
//!
//! The fungible token backing stakes and payouts is an external
//! collaborator. The pool only needs balance lookups and transfers, captured
//! by [`TokenLedger`]. [`TokenBalances`] is the in-memory implementation
//! used by simulations and tests. All mutations are atomic: either the full
//! transfer happens or both balances are unchanged.

use std::collections::HashMap;

use keno_types::{AccountId, KenoError, Result};
use rust_decimal::Decimal;

/// Minimal fungible-token interface consumed by the pool.
pub trait TokenLedger {
    /// Current balance of `account` (zero if unknown).
    fn balance_of(&self, account: AccountId) -> Decimal;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// `InvalidAmount` for non-positive amounts, `InsufficientBalance` if
    /// `from` holds less than `amount`.
    fn transfer(&mut self, from: AccountId, to: AccountId, amount: Decimal) -> Result<()>;

    /// Create new tokens (genesis distribution, faucets in tests).
    fn mint(&mut self, to: AccountId, amount: Decimal);

    /// Sum of all balances.
    fn total_supply(&self) -> Decimal;
}

/// In-memory token balances.
#[derive(Debug, Default)]
pub struct TokenBalances {
    balances: HashMap<AccountId, Decimal>,
}

impl TokenBalances {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenLedger for TokenBalances {
    fn balance_of(&self, account: AccountId) -> Decimal {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(KenoError::InvalidAmount { amount });
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(KenoError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        *self.balances.entry(from).or_default() -= amount;
        *self.balances.entry(to).or_default() += amount;
        Ok(())
    }

    fn mint(&mut self, to: AccountId, amount: Decimal) {
        *self.balances.entry(to).or_default() += amount;
    }

    fn total_supply(&self) -> Decimal {
        self.balances.values().copied().sum()
    }
}
