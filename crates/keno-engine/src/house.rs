//! The house: one pool, one Keno game, one oracle, and a clock.
//!
//! `KenoHouse` owns every component and reads the current time from the
//! injected [`Clock`], exposing the three surfaces callers actually use:
//!
//! - **admin**: stake, unstake, fund, unlock / approve / revoke the game,
//!   prune closed history
//! - **player**: buy a ticket, refund an expired one
//! - **oracle**: fulfill a randomness request, settling its ticket

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keno_oracle::RandomnessGateway;
use keno_pool::{CollateralPool, TokenBalances, TokenLedger};
use keno_types::{
    AccountId, ApprovalState, Clock, Fulfillment, GameId, HouseConfig, Result, Settlement,
    TicketId,
};
use rust_decimal::Decimal;

use crate::engine::KenoEngine;

pub struct KenoHouse<L: TokenLedger = TokenBalances> {
    pool: CollateralPool<L>,
    gateway: RandomnessGateway,
    engine: KenoEngine,
    clock: Arc<dyn Clock>,
}

impl<L: TokenLedger> KenoHouse<L> {
    /// Wire up a house from validated configuration.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` is invalid.
    pub fn new(config: HouseConfig, ledger: L, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let pool = CollateralPool::new(&config.pool, ledger)?;
        let gateway = RandomnessGateway::new(&config.oracle);
        let engine = KenoEngine::new(config.game, config.keno)?;

        tracing::info!(
            game = %config.game,
            owner = %config.pool.owner,
            vault = %config.pool.vault,
            oracle = %config.oracle.oracle,
            "Keno house initialized"
        );
        Ok(Self {
            pool,
            gateway,
            engine,
            clock,
        })
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // =====================================================================
    // Admin surface
    // =====================================================================

    pub fn stake(&mut self, staker: AccountId, amount: Decimal) -> Result<()> {
        let now = self.now();
        self.pool.stake(staker, amount, now)
    }

    pub fn unstake(&mut self, staker: AccountId, amount: Decimal) -> Result<()> {
        self.pool.unstake(staker, amount)
    }

    pub fn fund(&mut self, from: AccountId, amount: Decimal) -> Result<()> {
        self.pool.fund(from, amount)
    }

    pub fn unlock_game_for_approval(&mut self, caller: AccountId) -> Result<()> {
        let now = self.now();
        self.pool
            .unlock_game_for_approval(caller, self.engine.game(), now)
    }

    pub fn change_game_approval(
        &mut self,
        caller: AccountId,
        approve: bool,
    ) -> Result<ApprovalState> {
        let now = self.now();
        self.pool
            .change_game_approval(caller, self.engine.game(), approve, now)
    }

    pub fn revoke_game(&mut self, caller: AccountId) -> Result<()> {
        self.pool.revoke_game(caller, self.engine.game())
    }

    /// Drop settled and refunded tickets and closed randomness requests.
    /// Returns `(tickets, requests)` removed.
    pub fn prune_history(&mut self) -> (usize, usize) {
        (self.engine.prune_closed(), self.gateway.prune_closed())
    }

    // =====================================================================
    // Player surface
    // =====================================================================

    pub fn buy_ticket(
        &mut self,
        buyer: AccountId,
        numbers: &[u8],
        stake: Decimal,
    ) -> Result<TicketId> {
        let now = self.now();
        self.engine
            .buy_ticket(&mut self.pool, &mut self.gateway, buyer, numbers, stake, now)
    }

    /// Permissionless: anyone may trigger the refund of an expired ticket.
    pub fn refund_expired(&mut self, ticket_id: TicketId) -> Result<()> {
        let now = self.now();
        self.engine
            .refund_expired(&mut self.pool, &mut self.gateway, ticket_id, now)
    }

    // =====================================================================
    // Oracle surface
    // =====================================================================

    /// Accept a fulfillment from `caller` and settle the linked ticket.
    pub fn fulfill(&mut self, caller: AccountId, fulfillment: &Fulfillment) -> Result<Settlement> {
        let Self {
            pool,
            gateway,
            engine,
            ..
        } = self;
        gateway.fulfill(caller, fulfillment, |delivery| {
            engine.on_randomness_fulfilled(pool, delivery)
        })
    }

    // =====================================================================
    // Views
    // =====================================================================

    #[must_use]
    pub fn game(&self) -> GameId {
        self.engine.game()
    }

    #[must_use]
    pub fn pool(&self) -> &CollateralPool<L> {
        &self.pool
    }

    #[must_use]
    pub fn gateway(&self) -> &RandomnessGateway {
        &self.gateway
    }

    #[must_use]
    pub fn engine(&self) -> &KenoEngine {
        &self.engine
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        self.pool.ledger()
    }

    /// Mint or move player tokens outside the house flows.
    pub fn ledger_mut(&mut self) -> &mut L {
        self.pool.ledger_mut()
    }

    /// See [`CollateralPool::verify_accounting`].
    pub fn verify_accounting(&self) -> Result<()> {
        self.pool.verify_accounting()
    }
}
