//! Staker positions in the collateral pool.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A staker's position. Mutated only by that staker's stake/unstake calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub staker: AccountId,
    /// Principal currently staked.
    pub amount: Decimal,
    /// Time of the most recent top-up.
    pub staked_at: DateTime<Utc>,
}

impl Stake {
    #[must_use]
    pub fn new(staker: AccountId, amount: Decimal, staked_at: DateTime<Utc>) -> Self {
        Self {
            staker,
            amount,
            staked_at,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_serde_roundtrip() {
        let stake = Stake::new(
            AccountId::from_label("alice"),
            Decimal::new(100_000, 2),
            Utc::now(),
        );
        let json = serde_json::to_string(&stake).unwrap();
        let back: Stake = serde_json::from_str(&json).unwrap();
        assert_eq!(stake, back);
        assert!(!back.is_empty());
    }
}
