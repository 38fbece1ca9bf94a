//! Configuration types for the pool, the Keno game, and the oracle.

use std::path::Path;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, GameId, KenoError, PayTable, Result, constants};

fn secs_to_delta(secs: u64, field: &str) -> Result<TimeDelta> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| KenoError::Configuration(format!("{field} of {secs}s is out of range")))
}

/// Collateral pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool administrator: approves and revokes games.
    pub owner: AccountId,
    /// Token account holding the pool's funds.
    pub vault: AccountId,
    /// Minimum delay between unlock request and approval decision.
    pub approval_delay_secs: u64,
}

impl PoolConfig {
    /// Default pool owned by `owner`.
    #[must_use]
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            vault: AccountId::from_label("unified-liquidity-pool"),
            approval_delay_secs: constants::DEFAULT_APPROVAL_DELAY_SECS,
        }
    }

    pub fn approval_delay(&self) -> Result<TimeDelta> {
        secs_to_delta(self.approval_delay_secs, "approval_delay_secs")
    }
}

/// Keno game rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KenoConfig {
    /// Numbers run from 1 to `draw_range`.
    pub draw_range: u8,
    /// Distinct numbers drawn per ticket.
    pub draw_count: u8,
    /// Maximum numbers a player may pick.
    pub max_spots: u8,
    /// Minimum stake per ticket.
    pub min_stake: Decimal,
    /// Maximum stake per ticket.
    pub max_stake: Decimal,
    /// How long a ticket waits for randomness before it can be refunded.
    pub refund_timeout_secs: u64,
    /// Payout policy.
    pub pay_table: PayTable,
}

impl Default for KenoConfig {
    fn default() -> Self {
        Self {
            draw_range: constants::DEFAULT_DRAW_RANGE,
            draw_count: constants::DEFAULT_DRAW_COUNT,
            max_spots: constants::DEFAULT_MAX_SPOTS,
            min_stake: Decimal::from(constants::DEFAULT_MIN_STAKE_UNITS),
            max_stake: Decimal::from(constants::DEFAULT_MAX_STAKE_UNITS),
            refund_timeout_secs: constants::DEFAULT_REFUND_TIMEOUT_SECS,
            pay_table: PayTable::sample(),
        }
    }
}

impl KenoConfig {
    pub fn refund_timeout(&self) -> Result<TimeDelta> {
        secs_to_delta(self.refund_timeout_secs, "refund_timeout_secs")
    }

    /// Check internal consistency of the rules.
    ///
    /// # Errors
    /// Returns [`KenoError::Configuration`] for the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.draw_range == 0 {
            return Err(KenoError::Configuration("draw_range must be positive".into()));
        }
        if self.draw_count == 0 || self.draw_count > self.draw_range {
            return Err(KenoError::Configuration(format!(
                "draw_count {} must lie in 1..={}",
                self.draw_count, self.draw_range
            )));
        }
        if self.max_spots == 0 || self.max_spots > self.draw_range {
            return Err(KenoError::Configuration(format!(
                "max_spots {} must lie in 1..={}",
                self.max_spots, self.draw_range
            )));
        }
        if self.min_stake <= Decimal::ZERO || self.max_stake < self.min_stake {
            return Err(KenoError::Configuration(format!(
                "stake bounds [{}, {}] are invalid",
                self.min_stake, self.max_stake
            )));
        }
        self.refund_timeout()?;
        self.pay_table.validate(self.max_spots)?;
        for spots in 1..=self.max_spots {
            let top = self.pay_table.max_multiplier(spots);
            if self.max_stake.checked_mul(top).is_none() {
                return Err(KenoError::Configuration(format!(
                    "max_stake {} times the {spots}-spot multiplier {top} overflows",
                    self.max_stake
                )));
            }
        }
        Ok(())
    }
}

/// Randomness oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// The only identity allowed to fulfill randomness requests.
    pub oracle: AccountId,
}

/// Complete deployment: one pool, one Keno game, one oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseConfig {
    /// Address of the Keno game.
    pub game: GameId,
    pub pool: PoolConfig,
    #[serde(default)]
    pub keno: KenoConfig,
    pub oracle: OracleConfig,
}

impl HouseConfig {
    /// Default rules for the given owner and oracle.
    #[must_use]
    pub fn new(owner: AccountId, oracle: AccountId) -> Self {
        Self {
            game: GameId::from_label("keno"),
            pool: PoolConfig::new(owner),
            keno: KenoConfig::default(),
            oracle: OracleConfig { oracle },
        }
    }

    /// Parse from JSON and validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON file and validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.pool.approval_delay()?;
        if self.pool.vault == self.pool.owner {
            return Err(KenoError::Configuration(
                "pool vault must differ from the owner account".into(),
            ));
        }
        self.keno.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = HouseConfig::new(AccountId::from_label("owner"), AccountId::from_label("oracle"));
        cfg.validate().unwrap();
        assert_eq!(cfg.pool.approval_delay().unwrap(), TimeDelta::days(1));
        assert_eq!(cfg.keno.draw_range, 80);
        assert_eq!(cfg.keno.draw_count, 20);
        assert_eq!(cfg.keno.max_spots, 10);
    }

    #[test]
    fn draw_count_above_range_rejected() {
        let cfg = KenoConfig {
            draw_count: 81,
            ..KenoConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(KenoError::Configuration(_))));
    }

    #[test]
    fn inverted_stake_bounds_rejected() {
        let cfg = KenoConfig {
            min_stake: Decimal::new(10, 0),
            max_stake: Decimal::ONE,
            ..KenoConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn pay_table_must_cover_max_spots() {
        let cfg = KenoConfig {
            max_spots: 12,
            ..KenoConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unpayable_max_stake_rejected() {
        let cfg = KenoConfig {
            max_stake: Decimal::MAX,
            ..KenoConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("overflows"), "Got: {err}");

        let cfg = KenoConfig {
            max_stake: Decimal::from(10_i64.pow(18)),
            ..KenoConfig::default()
        };
        cfg.validate().unwrap();
    }

    #[test]
    fn oversized_delay_rejected() {
        let mut cfg = PoolConfig::new(AccountId::from_label("owner"));
        cfg.approval_delay_secs = u64::MAX;
        assert!(cfg.approval_delay().is_err());
    }

    #[test]
    fn json_roundtrip_and_partial_keno_section() {
        let cfg = HouseConfig::new(AccountId::from_label("owner"), AccountId::from_label("oracle"));
        let json = serde_json::to_string(&cfg).unwrap();
        let back = HouseConfig::from_json_str(&json).unwrap();
        assert_eq!(back.game, cfg.game);
        assert_eq!(back.keno.pay_table, cfg.keno.pay_table);

        // keno rules may be partially specified; the rest falls back to defaults
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["keno"] = serde_json::json!({ "refund_timeout_secs": 60 });
        let partial = HouseConfig::from_json_str(&value.to_string()).unwrap();
        assert_eq!(partial.keno.refund_timeout_secs, 60);
        assert_eq!(partial.keno.max_spots, 10);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = HouseConfig::from_json_file("/nonexistent/keno.json").unwrap_err();
        assert!(matches!(err, KenoError::Io(_)));
    }
}
