//! Collateral pool: stakes, bankroll, and the per-game buckets drawn on by
//! approved games.
//!
//! The vault's token balance is split into three parts:
//!
//! ```text
//! holdings = free collateral + escrowed ticket stakes + reserved payouts
//! ```
//!
//! Stakers may only withdraw from free collateral. Games may only open new
//! reservations or escrows while approved; a game that loses approval can
//! still wind down what it already holds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use keno_types::{
    AccountId, ApprovalState, GameId, KenoError, PoolConfig, Result, Stake,
};
use rust_decimal::Decimal;

use crate::{
    accounting::PoolAccounting,
    ledger::{TokenBalances, TokenLedger},
    registry::ApprovalRegistry,
};

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(KenoError::InvalidAmount { amount });
    }
    Ok(())
}

/// The unified liquidity pool.
pub struct CollateralPool<L: TokenLedger = TokenBalances> {
    /// Token ledger holding every balance, including the vault's.
    ledger: L,
    /// Account whose balance is the pool's holdings.
    vault: AccountId,
    /// Principal per staker.
    stakes: HashMap<AccountId, Stake>,
    total_staked: Decimal,
    /// Outstanding payout reservations per game.
    reserved: HashMap<GameId, Decimal>,
    /// Player stakes held for unsettled tickets, per game.
    escrowed: HashMap<GameId, Decimal>,
    registry: ApprovalRegistry,
    accounting: PoolAccounting,
}

impl<L: TokenLedger> CollateralPool<L> {
    /// Create an empty pool over `ledger`.
    ///
    /// # Errors
    /// Returns `Configuration` if the approval delay does not fit a duration.
    pub fn new(config: &PoolConfig, ledger: L) -> Result<Self> {
        Ok(Self {
            ledger,
            vault: config.vault,
            stakes: HashMap::new(),
            total_staked: Decimal::ZERO,
            reserved: HashMap::new(),
            escrowed: HashMap::new(),
            registry: ApprovalRegistry::new(config.owner, config.approval_delay()?),
            accounting: PoolAccounting::new(),
        })
    }

    // =====================================================================
    // Staking
    // =====================================================================

    /// Move `amount` from `staker` into the pool and credit their stake.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientBalance` if the staker's token balance is short
    pub fn stake(&mut self, staker: AccountId, amount: Decimal, now: DateTime<Utc>) -> Result<()> {
        ensure_positive(amount)?;
        self.ledger.transfer(staker, self.vault, amount)?;
        self.accounting.record_inflow(amount);

        let position = self
            .stakes
            .entry(staker)
            .or_insert_with(|| Stake::new(staker, Decimal::ZERO, now));
        position.amount += amount;
        position.staked_at = now;
        self.total_staked += amount;

        tracing::info!(
            staker = %staker,
            amount = %amount,
            position = %position.amount,
            total_staked = %self.total_staked,
            "Stake deposited"
        );
        Ok(())
    }

    /// Withdraw `amount` of the staker's principal.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientStake` if `amount` exceeds the recorded stake
    /// - `PoolLocked` if free collateral cannot cover the withdrawal
    pub fn unstake(&mut self, staker: AccountId, amount: Decimal) -> Result<()> {
        ensure_positive(amount)?;
        let staked = self.stake_of(staker);
        if amount > staked {
            return Err(KenoError::InsufficientStake {
                requested: amount,
                staked,
            });
        }
        let free = self.free_collateral();
        if amount > free {
            tracing::warn!(
                staker = %staker,
                requested = %amount,
                free = %free,
                "Unstake blocked by outstanding obligations"
            );
            return Err(KenoError::PoolLocked {
                requested: amount,
                free,
            });
        }

        self.ledger.transfer(self.vault, staker, amount)?;
        self.accounting.record_outflow(amount);
        self.total_staked -= amount;
        if let Some(position) = self.stakes.get_mut(&staker) {
            position.amount -= amount;
            if position.is_empty() {
                self.stakes.remove(&staker);
            }
        }

        tracing::info!(
            staker = %staker,
            amount = %amount,
            remaining = %self.stake_of(staker),
            total_staked = %self.total_staked,
            "Stake withdrawn"
        );
        Ok(())
    }

    /// Top up the bankroll without taking a stake position.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientBalance` if `from` is short
    pub fn fund(&mut self, from: AccountId, amount: Decimal) -> Result<()> {
        ensure_positive(amount)?;
        self.ledger.transfer(from, self.vault, amount)?;
        self.accounting.record_inflow(amount);
        tracing::info!(
            from = %from,
            amount = %amount,
            holdings = %self.holdings(),
            "Pool funded"
        );
        Ok(())
    }

    // =====================================================================
    // Game-facing collateral
    // =====================================================================

    /// Only approved games may open new positions against the pool.
    fn ensure_may_open(&self, game: GameId) -> Result<()> {
        self.registry.ensure_approved(game)
    }

    /// Approved games may always close positions. Others may only wind down
    /// positions opened under an earlier approval.
    fn ensure_may_close(&self, game: GameId, outstanding: Decimal) -> Result<()> {
        if self.registry.is_approved(game) || outstanding > Decimal::ZERO {
            return Ok(());
        }
        Err(KenoError::unauthorized(format!(
            "{game} is {} and holds no open positions",
            self.registry.state(game)
        )))
    }

    /// Set aside `amount` of free collateral for a possible payout.
    ///
    /// # Errors
    /// - `GameNotApproved` unless `game` is approved
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientLiquidity` if free collateral is short
    pub fn reserve(&mut self, game: GameId, amount: Decimal) -> Result<()> {
        self.ensure_may_open(game)?;
        ensure_positive(amount)?;
        let free = self.free_collateral();
        if amount > free {
            return Err(KenoError::InsufficientLiquidity {
                needed: amount,
                available: free,
            });
        }

        let bucket = self.reserved.entry(game).or_default();
        *bucket += amount;
        tracing::debug!(
            game = %game,
            amount = %amount,
            reserved = %bucket,
            "Collateral reserved"
        );
        Ok(())
    }

    /// Return `amount` of a reservation to free collateral.
    ///
    /// # Errors
    /// - `Unauthorized` if the game is neither approved nor holding a reservation
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientReserve` if `amount` exceeds the reservation
    pub fn release(&mut self, game: GameId, amount: Decimal) -> Result<()> {
        let reserved = self.reserved_for(game);
        self.ensure_may_close(game, reserved)?;
        ensure_positive(amount)?;
        if amount > reserved {
            return Err(KenoError::InsufficientReserve {
                game,
                needed: amount,
                reserved,
            });
        }

        self.debit_reserve(game, amount);
        tracing::debug!(
            game = %game,
            amount = %amount,
            reserved = %self.reserved_for(game),
            "Reservation released"
        );
        Ok(())
    }

    /// Pay `amount` out of the game's reservation to `recipient`.
    ///
    /// # Errors
    /// - `Unauthorized` if the game is neither approved nor holding a reservation
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientReserve` if `amount` exceeds the reservation
    pub fn settle(&mut self, game: GameId, recipient: AccountId, amount: Decimal) -> Result<()> {
        let reserved = self.reserved_for(game);
        self.ensure_may_close(game, reserved)?;
        ensure_positive(amount)?;
        if amount > reserved {
            return Err(KenoError::InsufficientReserve {
                game,
                needed: amount,
                reserved,
            });
        }

        self.ledger.transfer(self.vault, recipient, amount)?;
        self.accounting.record_outflow(amount);
        self.debit_reserve(game, amount);
        tracing::info!(
            game = %game,
            recipient = %recipient,
            amount = %amount,
            "Payout settled from pool"
        );
        Ok(())
    }

    /// Pull `amount` from `payer` into the pool, held for `game`.
    ///
    /// # Errors
    /// - `GameNotApproved` unless `game` is approved
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientBalance` if `payer` is short
    pub fn escrow(&mut self, game: GameId, payer: AccountId, amount: Decimal) -> Result<()> {
        self.ensure_may_open(game)?;
        ensure_positive(amount)?;
        self.ledger.transfer(payer, self.vault, amount)?;
        self.accounting.record_inflow(amount);

        let bucket = self.escrowed.entry(game).or_default();
        *bucket += amount;
        tracing::debug!(
            game = %game,
            payer = %payer,
            amount = %amount,
            escrowed = %bucket,
            "Stake escrowed"
        );
        Ok(())
    }

    /// Turn `amount` of escrow into free pool collateral.
    ///
    /// # Errors
    /// - `Unauthorized` if the game is neither approved nor holding escrow
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientEscrow` if `amount` exceeds the escrow
    pub fn collect_escrow(&mut self, game: GameId, amount: Decimal) -> Result<()> {
        self.check_escrow_debit(game, amount)?;
        self.debit_escrow(game, amount);
        tracing::debug!(game = %game, amount = %amount, "Escrow collected into pool");
        Ok(())
    }

    /// Return `amount` of escrow to `recipient`.
    ///
    /// # Errors
    /// - `Unauthorized` if the game is neither approved nor holding escrow
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InsufficientEscrow` if `amount` exceeds the escrow
    pub fn refund_escrow(
        &mut self,
        game: GameId,
        recipient: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        self.check_escrow_debit(game, amount)?;
        self.ledger.transfer(self.vault, recipient, amount)?;
        self.accounting.record_outflow(amount);
        self.debit_escrow(game, amount);
        tracing::info!(
            game = %game,
            recipient = %recipient,
            amount = %amount,
            "Escrow refunded"
        );
        Ok(())
    }

    fn check_escrow_debit(&self, game: GameId, amount: Decimal) -> Result<()> {
        let escrowed = self.escrowed_for(game);
        self.ensure_may_close(game, escrowed)?;
        ensure_positive(amount)?;
        if amount > escrowed {
            return Err(KenoError::InsufficientEscrow {
                game,
                needed: amount,
                escrowed,
            });
        }
        Ok(())
    }

    fn debit_reserve(&mut self, game: GameId, amount: Decimal) {
        if let Some(bucket) = self.reserved.get_mut(&game) {
            *bucket -= amount;
            if bucket.is_zero() {
                self.reserved.remove(&game);
            }
        }
    }

    fn debit_escrow(&mut self, game: GameId, amount: Decimal) {
        if let Some(bucket) = self.escrowed.get_mut(&game) {
            *bucket -= amount;
            if bucket.is_zero() {
                self.escrowed.remove(&game);
            }
        }
    }

    // =====================================================================
    // Approval registry (owner surface)
    // =====================================================================

    /// See [`ApprovalRegistry::unlock_for_approval`].
    ///
    /// # Errors
    /// `Unauthorized` or `AlreadyApproved`.
    pub fn unlock_game_for_approval(
        &mut self,
        caller: AccountId,
        game: GameId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.registry.unlock_for_approval(caller, game, now)
    }

    /// See [`ApprovalRegistry::finalize_approval`].
    ///
    /// # Errors
    /// `Unauthorized`, `NotPendingApproval`, or `DelayNotElapsed`.
    pub fn change_game_approval(
        &mut self,
        caller: AccountId,
        game: GameId,
        approve: bool,
        now: DateTime<Utc>,
    ) -> Result<ApprovalState> {
        self.registry.finalize_approval(caller, game, approve, now)
    }

    /// See [`ApprovalRegistry::revoke`].
    ///
    /// # Errors
    /// `Unauthorized` or `GameNotApproved`.
    pub fn revoke_game(&mut self, caller: AccountId, game: GameId) -> Result<()> {
        self.registry.revoke(caller, game)
    }

    #[must_use]
    pub fn registry(&self) -> &ApprovalRegistry {
        &self.registry
    }

    // =====================================================================
    // Views
    // =====================================================================

    #[must_use]
    pub fn stake_of(&self, staker: AccountId) -> Decimal {
        self.stakes
            .get(&staker)
            .map_or(Decimal::ZERO, |s| s.amount)
    }

    #[must_use]
    pub fn stake_position(&self, staker: AccountId) -> Option<&Stake> {
        self.stakes.get(&staker)
    }

    #[must_use]
    pub fn total_staked(&self) -> Decimal {
        self.total_staked
    }

    /// Vault token balance.
    #[must_use]
    pub fn holdings(&self) -> Decimal {
        self.ledger.balance_of(self.vault)
    }

    #[must_use]
    pub fn total_reserved(&self) -> Decimal {
        self.reserved.values().copied().sum()
    }

    #[must_use]
    pub fn total_escrowed(&self) -> Decimal {
        self.escrowed.values().copied().sum()
    }

    /// Holdings not backing any escrow or reservation. Never negative.
    #[must_use]
    pub fn free_collateral(&self) -> Decimal {
        (self.holdings() - self.total_escrowed() - self.total_reserved()).max(Decimal::ZERO)
    }

    #[must_use]
    pub fn reserved_for(&self, game: GameId) -> Decimal {
        self.reserved.get(&game).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn escrowed_for(&self, game: GameId) -> Decimal {
        self.escrowed.get(&game).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn vault(&self) -> AccountId {
        self.vault
    }

    #[must_use]
    pub fn accounting(&self) -> &PoolAccounting {
        &self.accounting
    }

    /// Check the vault balance against recorded flows and obligations.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` on mismatch.
    pub fn verify_accounting(&self) -> Result<()> {
        self.accounting.verify(
            self.holdings(),
            self.total_escrowed() + self.total_reserved(),
        )
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for minting and player transfers. Moving tokens
    /// into or out of the vault here bypasses pool accounting.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }
}
