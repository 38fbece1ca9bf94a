//! Pool accounting invariant checker.
//!
//! Invariant enforced after every pool operation:
//! ```text
//! vault balance == Σ(inflows) - Σ(outflows)
//! escrowed + reserved <= vault balance
//! ```
//!
//! Inflows are stakes, bankroll funding, and escrowed ticket stakes.
//! Outflows are unstakes, payouts, and escrow refunds. Collecting an escrow
//! or releasing a reservation moves value between buckets inside the vault
//! and touches neither side.

use keno_types::{KenoError, Result};
use rust_decimal::Decimal;

/// Running totals of value entering and leaving the pool vault.
#[derive(Debug, Default, Clone)]
pub struct PoolAccounting {
    inflows: Decimal,
    outflows: Decimal,
}

impl PoolAccounting {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record tokens arriving in the vault.
    pub fn record_inflow(&mut self, amount: Decimal) {
        self.inflows += amount;
    }

    /// Record tokens leaving the vault.
    pub fn record_outflow(&mut self, amount: Decimal) {
        self.outflows += amount;
    }

    /// What the vault should hold: inflows - outflows.
    #[must_use]
    pub fn expected_holdings(&self) -> Decimal {
        self.inflows - self.outflows
    }

    #[must_use]
    pub fn total_inflows(&self) -> Decimal {
        self.inflows
    }

    #[must_use]
    pub fn total_outflows(&self) -> Decimal {
        self.outflows
    }

    /// Verify the vault balance against the recorded flows and the
    /// outstanding obligations against the vault balance.
    ///
    /// # Errors
    /// Returns [`KenoError::SupplyInvariantViolation`] on any mismatch.
    pub fn verify(&self, actual_holdings: Decimal, obligations: Decimal) -> Result<()> {
        let expected = self.expected_holdings();
        if actual_holdings != expected {
            return Err(KenoError::SupplyInvariantViolation {
                reason: format!(
                    "vault holds {actual_holdings}, expected {expected} \
                     (inflows={}, outflows={})",
                    self.inflows, self.outflows
                ),
            });
        }
        if obligations > actual_holdings {
            return Err(KenoError::SupplyInvariantViolation {
                reason: format!(
                    "obligations {obligations} exceed vault holdings {actual_holdings}"
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_balances() {
        let acc = PoolAccounting::new();
        assert_eq!(acc.expected_holdings(), Decimal::ZERO);
        assert!(acc.verify(Decimal::ZERO, Decimal::ZERO).is_ok());
    }

    #[test]
    fn flows_net_out() {
        let mut acc = PoolAccounting::new();
        acc.record_inflow(Decimal::new(1000, 0));
        acc.record_inflow(Decimal::new(5, 0));
        acc.record_outflow(Decimal::new(15, 0));
        assert_eq!(acc.expected_holdings(), Decimal::new(990, 0));
        assert_eq!(acc.total_inflows(), Decimal::new(1005, 0));
        assert!(acc.verify(Decimal::new(990, 0), Decimal::new(990, 0)).is_ok());
    }

    #[test]
    fn untracked_vault_transfer_detected() {
        let mut acc = PoolAccounting::new();
        acc.record_inflow(Decimal::new(100, 0));
        let err = acc.verify(Decimal::new(101, 0), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, KenoError::SupplyInvariantViolation { .. }));
    }

    #[test]
    fn over_committed_vault_detected() {
        let mut acc = PoolAccounting::new();
        acc.record_inflow(Decimal::new(100, 0));
        let err = acc
            .verify(Decimal::new(100, 0), Decimal::new(101, 0))
            .unwrap_err();
        assert!(matches!(err, KenoError::SupplyInvariantViolation { .. }));
    }
}
