//! Ticket model: validated selections, ticket lifecycle, and settlements.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  randomness fulfilled  ┌─────────┐
//!   │ PENDING ├───────────────────────▶│ SETTLED │
//!   └────┬────┘                        └─────────┘
//!        │ oracle timeout refund
//!        ▼
//!   ┌──────────┐
//!   │ REFUNDED │
//!   └──────────┘
//! ```
//!
//! Both exits are terminal: a ticket leaves PENDING exactly once.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, GameId, KenoError, RequestId, Result, TicketId};

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Stake escrowed, waiting for randomness.
    Pending,
    /// Draw applied and payout disbursed. **Irreversible.**
    Settled,
    /// Oracle never answered; stake returned to the owner.
    Refunded,
}

impl TicketStatus {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Pending, Self::Settled | Self::Refunded))
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

// ---------------------------------------------------------------------------
// TicketSelection
// ---------------------------------------------------------------------------

/// A validated, sorted set of distinct numbers picked by a player.
///
/// Construction is the only validation point, so a `TicketSelection` in hand
/// is always within the configured size and range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketSelection(Vec<u8>);

impl TicketSelection {
    /// Validate a raw selection.
    ///
    /// Checks run in order: size (`1..=max_spots`), range (`1..=draw_range`),
    /// then duplicates.
    ///
    /// # Errors
    /// `InvalidTicketSize`, `NumberOutOfRange`, or `DuplicateNumber`.
    pub fn new(numbers: &[u8], max_spots: u8, draw_range: u8) -> Result<Self> {
        if numbers.is_empty() || numbers.len() > usize::from(max_spots) {
            return Err(KenoError::InvalidTicketSize {
                size: numbers.len(),
                limit: usize::from(max_spots) + 1,
            });
        }

        if let Some(&number) = numbers.iter().find(|&&n| n == 0 || n > draw_range) {
            return Err(KenoError::NumberOutOfRange {
                number,
                max: draw_range,
            });
        }

        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(KenoError::DuplicateNumber(pair[0]));
        }

        Ok(Self(sorted))
    }

    /// Number of spots picked.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn spots(&self) -> u8 {
        // bounded by max_spots: u8 at construction
        self.0.len() as u8
    }

    #[must_use]
    pub fn numbers(&self) -> &[u8] {
        &self.0
    }

    /// How many of the drawn numbers were picked.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn count_hits(&self, drawn: &[u8]) -> u8 {
        drawn
            .iter()
            .filter(|&n| self.0.binary_search(n).is_ok())
            .count() as u8
    }
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// The derived result of a draw for one ticket. Not a ledger record: it is
/// recomputable from the random value, the selection, and the pay table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub ticket_id: TicketId,
    pub request_id: RequestId,
    /// Drawn numbers, sorted ascending.
    pub drawn: Vec<u8>,
    pub hits: u8,
    pub multiplier: Decimal,
    /// Amount paid to the ticket owner (`stake × multiplier`).
    pub payout: Decimal,
}

impl Settlement {
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.payout > Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

/// A purchased ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub owner: AccountId,
    /// The game the ticket was bought from.
    pub game: GameId,
    pub selection: TicketSelection,
    /// Amount escrowed from the owner.
    pub stake: Decimal,
    /// Pool collateral reserved for the maximum possible payout.
    pub reservation: Decimal,
    pub status: TicketStatus,
    /// Randomness request that will settle this ticket.
    pub request_id: RequestId,
    pub purchased_at: DateTime<Utc>,
    /// Present once settled.
    pub outcome: Option<Settlement>,
}

impl Ticket {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == TicketStatus::Pending
    }

    /// PENDING → SETTLED, recording the outcome.
    ///
    /// # Errors
    /// Returns `TicketNotPending` if the ticket already left PENDING.
    pub fn mark_settled(&mut self, outcome: Settlement) -> Result<()> {
        self.transition(TicketStatus::Settled)?;
        self.outcome = Some(outcome);
        Ok(())
    }

    /// PENDING → REFUNDED.
    ///
    /// # Errors
    /// Returns `TicketNotPending` if the ticket already left PENDING.
    pub fn mark_refunded(&mut self) -> Result<()> {
        self.transition(TicketStatus::Refunded)
    }

    fn transition(&mut self, target: TicketStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(KenoError::TicketNotPending {
                ticket: self.id,
                status: self.status,
            });
        }
        self.status = target;
        Ok(())
    }
}

/// Dummy ticket for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Ticket {
    pub fn dummy(numbers: &[u8], stake: Decimal, request_id: RequestId) -> Self {
        Self {
            id: TicketId::new(),
            owner: AccountId::random(),
            game: GameId::from_label("keno"),
            selection: TicketSelection::new(numbers, 10, 80).expect("dummy selection"),
            stake,
            reservation: stake,
            status: TicketStatus::Pending,
            request_id,
            purchased_at: Utc::now(),
            outcome: None,
        }
    }
}
