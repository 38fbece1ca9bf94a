//! Ticket engine: purchase, settlement, and refund of Keno tickets.
//!
//! ## Ticket Lifecycle
//!
//! ```text
//! buy_ticket:   validate → escrow(stake) → reserve(max payout) → request randomness
//!                                                  │
//!                   ┌──────────────────────────────┴───────────────┐
//!                   ▼                                              ▼
//! on_randomness_fulfilled:                       refund_expired (after timeout):
//!   draw → hits → payout                           cancel request
//!   collect_escrow(stake)                          refund_escrow(stake)
//!   settle(payout), release(rest)                  release(reservation)
//!   PENDING → SETTLED                              PENDING → REFUNDED
//! ```
//!
//! Every operation validates against the pool and gateway before mutating
//! either, so a rejected call leaves no partial state behind.
//!
//! A request settles at most one ticket: once the ticket leaves PENDING,
//! a replayed delivery finds nothing to settle and gets `UnknownTicket`.
//!
//! Settled and refunded tickets stay in the engine as history until
//! [`KenoEngine::prune_closed`] drops them.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use keno_oracle::RandomnessGateway;
use keno_pool::{CollateralPool, TokenLedger};
use keno_types::{
    AccountId, GameId, KenoConfig, KenoError, RandomnessDelivery, RequestId, Result, Settlement,
    Ticket, TicketId, TicketSelection, TicketStatus,
};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::draw::draw_numbers;

/// Seed handed to the oracle: binds the request to the ticket's contents.
fn ticket_seed(
    ticket_id: TicketId,
    buyer: AccountId,
    selection: &TicketSelection,
    stake: Decimal,
    now: DateTime<Utc>,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"keno:ticket:v1:");
    hasher.update(ticket_id.0.as_bytes());
    hasher.update(buyer.as_bytes());
    hasher.update(selection.numbers());
    hasher.update(stake.to_string().as_bytes());
    hasher.update(now.timestamp_millis().to_le_bytes());
    hasher.finalize().into()
}

/// One Keno game drawing against a shared pool.
pub struct KenoEngine {
    game: GameId,
    config: KenoConfig,
    refund_timeout: TimeDelta,
    tickets: HashMap<TicketId, Ticket>,
    by_request: HashMap<RequestId, TicketId>,
}

impl KenoEngine {
    /// Engine for `game` with validated rules.
    ///
    /// # Errors
    /// Returns `Configuration` if the rules are inconsistent.
    pub fn new(game: GameId, config: KenoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            game,
            refund_timeout: config.refund_timeout()?,
            config,
            tickets: HashMap::new(),
            by_request: HashMap::new(),
        })
    }

    fn check_stake(&self, stake: Decimal) -> Result<()> {
        if stake <= Decimal::ZERO {
            return Err(KenoError::InvalidAmount { amount: stake });
        }
        if stake < self.config.min_stake || stake > self.config.max_stake {
            return Err(KenoError::StakeOutOfBounds {
                amount: stake,
                min: self.config.min_stake,
                max: self.config.max_stake,
            });
        }
        Ok(())
    }

    // =====================================================================
    // Purchase
    // =====================================================================

    /// Buy a ticket for `buyer`.
    ///
    /// # Errors
    /// - `InvalidTicketSize`, `NumberOutOfRange`, `DuplicateNumber` for a bad selection
    /// - `InvalidAmount`, `StakeOutOfBounds` for a bad stake
    /// - `GameNotApproved` unless this game is approved
    /// - `InsufficientLiquidity` if the pool cannot cover the maximum payout
    /// - `InsufficientBalance` if the buyer cannot pay the stake
    pub fn buy_ticket<L: TokenLedger>(
        &mut self,
        pool: &mut CollateralPool<L>,
        gateway: &mut RandomnessGateway,
        buyer: AccountId,
        numbers: &[u8],
        stake: Decimal,
        now: DateTime<Utc>,
    ) -> Result<TicketId> {
        let selection =
            TicketSelection::new(numbers, self.config.max_spots, self.config.draw_range)?;
        self.check_stake(stake)?;
        pool.registry().ensure_approved(self.game)?;

        let free = pool.free_collateral();
        let reservation = stake
            .checked_mul(self.config.pay_table.max_multiplier(selection.spots()))
            .ok_or(KenoError::InsufficientLiquidity {
                needed: Decimal::MAX,
                available: free,
            })?;
        if reservation > free {
            return Err(KenoError::InsufficientLiquidity {
                needed: reservation,
                available: free,
            });
        }

        pool.escrow(self.game, buyer, stake)?;
        if reservation > Decimal::ZERO {
            if let Err(err) = pool.reserve(self.game, reservation) {
                pool.refund_escrow(self.game, buyer, stake)?;
                return Err(err);
            }
        }

        let id = TicketId::new();
        let seed = ticket_seed(id, buyer, &selection, stake, now);
        let request_id = gateway.request_randomness(self.game, seed, now);

        tracing::info!(
            ticket = %id,
            buyer = %buyer,
            spots = selection.spots(),
            stake = %stake,
            reservation = %reservation,
            request = %request_id,
            seed = %hex::encode(seed),
            "Ticket purchased"
        );

        self.by_request.insert(request_id, id);
        self.tickets.insert(
            id,
            Ticket {
                id,
                owner: buyer,
                game: self.game,
                selection,
                stake,
                reservation,
                status: TicketStatus::Pending,
                request_id,
                purchased_at: now,
                outcome: None,
            },
        );
        Ok(id)
    }

    // =====================================================================
    // Settlement
    // =====================================================================

    /// Settle the ticket linked to a fulfilled randomness request.
    ///
    /// # Errors
    /// - `UnknownTicket` if no pending ticket of this game is linked to the
    ///   request, including one this request already settled
    /// - `InsufficientEscrow` / `InsufficientReserve` if the pool lost track
    ///   of the ticket's collateral
    pub fn on_randomness_fulfilled<L: TokenLedger>(
        &mut self,
        pool: &mut CollateralPool<L>,
        delivery: &RandomnessDelivery,
    ) -> Result<Settlement> {
        let request_id = delivery.request_id;
        if delivery.requester != self.game {
            return Err(KenoError::UnknownTicket(request_id));
        }
        let ticket = self
            .by_request
            .get(&request_id)
            .and_then(|id| self.tickets.get_mut(id))
            .filter(|t| t.is_pending())
            .ok_or(KenoError::UnknownTicket(request_id))?;

        let escrowed = pool.escrowed_for(ticket.game);
        if escrowed < ticket.stake {
            return Err(KenoError::InsufficientEscrow {
                game: ticket.game,
                needed: ticket.stake,
                escrowed,
            });
        }
        let reserved = pool.reserved_for(ticket.game);
        if reserved < ticket.reservation {
            return Err(KenoError::InsufficientReserve {
                game: ticket.game,
                needed: ticket.reservation,
                reserved,
            });
        }

        let spots = ticket.selection.spots();
        let drawn = draw_numbers(&delivery.value, self.config.draw_range, self.config.draw_count);
        let hits = ticket.selection.count_hits(&drawn);
        let multiplier = self.config.pay_table.multiplier(spots, hits);
        let payout = ticket
            .stake
            .checked_mul(multiplier)
            .filter(|payout| *payout <= ticket.reservation)
            .ok_or_else(|| {
                KenoError::Internal(format!("payout for {} exceeds its reservation", ticket.id))
            })?;
        let unused = ticket.reservation - payout;

        pool.collect_escrow(ticket.game, ticket.stake)?;
        if payout > Decimal::ZERO {
            pool.settle(ticket.game, ticket.owner, payout)?;
        }
        if unused > Decimal::ZERO {
            pool.release(ticket.game, unused)?;
        }

        let settlement = Settlement {
            ticket_id: ticket.id,
            request_id,
            drawn,
            hits,
            multiplier,
            payout,
        };
        ticket.mark_settled(settlement.clone())?;

        tracing::info!(
            ticket = %ticket.id,
            owner = %ticket.owner,
            request = %request_id,
            spots,
            hits,
            multiplier = %multiplier,
            payout = %payout,
            "Ticket settled"
        );
        Ok(settlement)
    }

    // =====================================================================
    // Refund
    // =====================================================================

    /// Refund a ticket whose randomness never arrived. Anyone may call this
    /// once the refund timeout has passed.
    ///
    /// # Errors
    /// - `TicketNotFound` / `TicketNotPending`
    /// - `RefundNotAvailable` before `purchased_at + refund_timeout`
    /// - `UnknownRequest` / `AlreadyFulfilled` if the request is no longer open
    pub fn refund_expired<L: TokenLedger>(
        &mut self,
        pool: &mut CollateralPool<L>,
        gateway: &mut RandomnessGateway,
        ticket_id: TicketId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let ticket = self
            .tickets
            .get_mut(&ticket_id)
            .ok_or(KenoError::TicketNotFound(ticket_id))?;
        if !ticket.is_pending() {
            return Err(KenoError::TicketNotPending {
                ticket: ticket_id,
                status: ticket.status,
            });
        }
        let available_at = ticket.purchased_at + self.refund_timeout;
        if now < available_at {
            return Err(KenoError::RefundNotAvailable {
                ticket: ticket_id,
                available_at,
            });
        }
        if !gateway
            .request(ticket.request_id)
            .is_some_and(keno_types::RandomnessRequest::is_open)
        {
            return Err(KenoError::UnknownRequest(ticket.request_id));
        }
        if pool.escrowed_for(ticket.game) < ticket.stake
            || pool.reserved_for(ticket.game) < ticket.reservation
        {
            return Err(KenoError::Internal(format!(
                "pool no longer holds collateral for {ticket_id}"
            )));
        }

        gateway.cancel(ticket.request_id)?;
        pool.refund_escrow(ticket.game, ticket.owner, ticket.stake)?;
        if ticket.reservation > Decimal::ZERO {
            pool.release(ticket.game, ticket.reservation)?;
        }
        ticket.mark_refunded()?;

        tracing::info!(
            ticket = %ticket_id,
            owner = %ticket.owner,
            request = %ticket.request_id,
            stake = %ticket.stake,
            "Expired ticket refunded"
        );
        Ok(())
    }

    /// Forget settled and refunded tickets; returns how many were removed.
    /// Pending tickets and their request links are untouched.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.tickets.len();
        self.tickets.retain(|_, t| t.is_pending());
        let tickets = &self.tickets;
        self.by_request.retain(|_, id| tickets.contains_key(id));
        let pruned = before - self.tickets.len();
        tracing::debug!(
            game = %self.game,
            pruned,
            pending = self.tickets.len(),
            "Closed tickets pruned"
        );
        pruned
    }

    // =====================================================================
    // Views
    // =====================================================================

    #[must_use]
    pub fn ticket(&self, ticket_id: TicketId) -> Option<&Ticket> {
        self.tickets.get(&ticket_id)
    }

    #[must_use]
    pub fn ticket_for_request(&self, request_id: RequestId) -> Option<&Ticket> {
        self.by_request
            .get(&request_id)
            .and_then(|id| self.tickets.get(id))
    }

    /// Tickets still waiting for randomness.
    pub fn pending_tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.values().filter(|t| t.is_pending())
    }

    #[must_use]
    pub fn game(&self) -> GameId {
        self.game
    }

    #[must_use]
    pub fn config(&self) -> &KenoConfig {
        &self.config
    }
}
