//! Pay table: the injected payout policy.
//!
//! Maps `(spots picked, numbers hit)` to a multiplier of the ticket stake.
//! The engine never embeds payout values; it only looks them up here.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{KenoError, Result};

/// Multipliers per spot count. `rows[spots][hits]` is the multiplier paid on
/// a ticket with `spots` numbers that matched `hits` drawn numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayTable {
    rows: BTreeMap<u8, Vec<Decimal>>,
}

impl PayTable {
    #[must_use]
    pub fn new(rows: BTreeMap<u8, Vec<Decimal>>) -> Self {
        Self { rows }
    }

    /// A sample ladder for 1 to 10 spots. Deployments are expected to
    /// supply their own table through configuration.
    #[must_use]
    pub fn sample() -> Self {
        let ladder: [&[i64]; 10] = [
            &[0, 3],
            &[0, 1, 9],
            &[0, 0, 2, 27],
            &[0, 0, 1, 5, 75],
            &[0, 0, 0, 3, 12, 500],
            &[0, 0, 0, 2, 4, 70, 1_500],
            &[0, 0, 0, 1, 2, 20, 300, 5_000],
            &[0, 0, 0, 0, 2, 10, 60, 600, 10_000],
            &[0, 0, 0, 0, 1, 5, 30, 200, 4_000, 25_000],
            &[0, 0, 0, 0, 0, 2, 20, 100, 1_000, 5_000, 100_000],
        ];
        let rows: BTreeMap<u8, Vec<Decimal>> = (1u8..)
            .zip(ladder)
            .map(|(spots, row)| {
                (spots, row.iter().copied().map(Decimal::from).collect::<Vec<_>>())
            })
            .collect();
        Self { rows }
    }

    /// Multiplier for a ticket with `spots` picks and `hits` matches.
    /// Missing entries pay nothing.
    #[must_use]
    pub fn multiplier(&self, spots: u8, hits: u8) -> Decimal {
        self.rows
            .get(&spots)
            .and_then(|row| row.get(usize::from(hits)))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Largest multiplier a ticket with `spots` picks can ever earn.
    #[must_use]
    pub fn max_multiplier(&self, spots: u8) -> Decimal {
        self.rows
            .get(&spots)
            .and_then(|row| row.iter().max())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Check that every spot count `1..=max_spots` has a complete row of
    /// non-negative multipliers.
    ///
    /// # Errors
    /// Returns [`KenoError::Configuration`] describing the first bad row.
    pub fn validate(&self, max_spots: u8) -> Result<()> {
        for spots in 1..=max_spots {
            let row = self.rows.get(&spots).ok_or_else(|| {
                KenoError::Configuration(format!("pay table has no row for {spots} spots"))
            })?;
            if row.len() != usize::from(spots) + 1 {
                return Err(KenoError::Configuration(format!(
                    "pay table row for {spots} spots has {} entries, expected {}",
                    row.len(),
                    usize::from(spots) + 1
                )));
            }
            if row.iter().any(Decimal::is_sign_negative) {
                return Err(KenoError::Configuration(format!(
                    "pay table row for {spots} spots has a negative multiplier"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PayTable {
    fn default() -> Self {
        Self::sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_valid_for_ten_spots() {
        PayTable::sample().validate(10).unwrap();
    }

    #[test]
    fn lookup() {
        let table = PayTable::sample();
        assert_eq!(table.multiplier(5, 5), Decimal::new(500, 0));
        assert_eq!(table.multiplier(5, 2), Decimal::ZERO);
        assert_eq!(table.max_multiplier(3), Decimal::new(27, 0));
    }

    #[test]
    fn missing_entries_pay_zero() {
        let table = PayTable::sample();
        assert_eq!(table.multiplier(11, 11), Decimal::ZERO);
        assert_eq!(table.multiplier(2, 7), Decimal::ZERO);
        assert_eq!(table.max_multiplier(42), Decimal::ZERO);
    }

    #[test]
    fn validate_rejects_short_row() {
        let mut rows = BTreeMap::new();
        rows.insert(1, vec![Decimal::ZERO, Decimal::new(3, 0)]);
        rows.insert(2, vec![Decimal::ZERO, Decimal::ONE]);
        let err = PayTable::new(rows).validate(2).unwrap_err();
        assert!(matches!(err, KenoError::Configuration(_)));
    }

    #[test]
    fn validate_rejects_negative_and_missing() {
        let mut rows = BTreeMap::new();
        rows.insert(1, vec![Decimal::ZERO, Decimal::new(-1, 0)]);
        assert!(PayTable::new(rows).validate(1).is_err());
        assert!(PayTable::new(BTreeMap::new()).validate(1).is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let table = PayTable::sample();
        let json = serde_json::to_string(&table).unwrap();
        let back: PayTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }
}
