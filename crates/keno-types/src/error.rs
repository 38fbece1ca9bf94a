//! Error types for the Keno pool and settlement engine.
//!
//! All errors use the `KENO_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by family:
//! - 1xx: Validation errors (fix the input and resubmit)
//! - 2xx: Authorization errors (missing role or game not approved)
//! - 3xx: Timing errors (retry once the gate opens)
//! - 4xx: Resource errors (retry after balances change)
//! - 5xx: Protocol errors (integration bug or replay; fatal for the call)
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ApprovalState, GameId, RequestId, TicketId, TicketStatus};

/// Central error enum for all Keno operations.
#[derive(Debug, Error)]
pub enum KenoError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The selection has too few or too many numbers. `limit` is exclusive.
    #[error("KENO_ERR_100: every ticket should have 1 to {limit} numbers, got {size}")]
    InvalidTicketSize { size: usize, limit: usize },

    /// A selected number lies outside `[1, max]`.
    #[error("KENO_ERR_101: Number {number} out of range 1..={max}")]
    NumberOutOfRange { number: u8, max: u8 },

    /// The same number was selected twice.
    #[error("KENO_ERR_102: Duplicate number in selection: {0}")]
    DuplicateNumber(u8),

    /// Amounts must be strictly positive.
    #[error("KENO_ERR_103: Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// Ticket stake outside the configured bounds.
    #[error("KENO_ERR_104: Stake {amount} outside allowed range [{min}, {max}]")]
    StakeOutOfBounds {
        amount: Decimal,
        min: Decimal,
        max: Decimal,
    },

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// The game is not currently approved to draw against the pool.
    #[error("KENO_ERR_200: Game not approved: {0}")]
    GameNotApproved(GameId),

    /// The caller lacks the role required for this operation.
    #[error("KENO_ERR_201: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The oracle's ed25519 signature over the fulfillment didn't verify.
    #[error("KENO_ERR_202: Oracle signature invalid for request {0}")]
    InvalidOracleSignature(RequestId),

    // =================================================================
    // Timing Errors (3xx)
    // =================================================================
    /// The approval delay has not elapsed yet.
    #[error("KENO_ERR_300: Approval delay for {game} not elapsed, ready at {ready_at}")]
    DelayNotElapsed {
        game: GameId,
        ready_at: DateTime<Utc>,
    },

    /// The refund timeout for a pending ticket has not elapsed yet.
    #[error("KENO_ERR_301: Refund for ticket {ticket} not available before {available_at}")]
    RefundNotAvailable {
        ticket: TicketId,
        available_at: DateTime<Utc>,
    },

    // =================================================================
    // Resource Errors (4xx)
    // =================================================================
    /// Unstake larger than the staker's recorded stake.
    #[error("KENO_ERR_400: Insufficient stake: requested {requested}, staked {staked}")]
    InsufficientStake { requested: Decimal, staked: Decimal },

    /// Withdrawal would leave outstanding payout obligations uncovered.
    #[error("KENO_ERR_401: Pool locked: requested {requested}, free collateral {free}")]
    PoolLocked { requested: Decimal, free: Decimal },

    /// Token balance too low for the transfer.
    #[error("KENO_ERR_402: Insufficient token balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// Free collateral cannot cover the requested reservation.
    #[error("KENO_ERR_403: Insufficient pool liquidity: need {needed}, free {available}")]
    InsufficientLiquidity { needed: Decimal, available: Decimal },

    /// The game tried to draw more than it has reserved.
    #[error("KENO_ERR_404: Insufficient reservation for {game}: need {needed}, reserved {reserved}")]
    InsufficientReserve {
        game: GameId,
        needed: Decimal,
        reserved: Decimal,
    },

    /// The game tried to move more escrow than it holds.
    #[error("KENO_ERR_405: Insufficient escrow for {game}: need {needed}, escrowed {escrowed}")]
    InsufficientEscrow {
        game: GameId,
        needed: Decimal,
        escrowed: Decimal,
    },

    // =================================================================
    // Protocol Errors (5xx)
    // =================================================================
    /// No open randomness request with this id.
    #[error("KENO_ERR_500: Unknown randomness request: {0}")]
    UnknownRequest(RequestId),

    /// The randomness request was already fulfilled (replay).
    #[error("KENO_ERR_501: Randomness request already fulfilled: {0}")]
    AlreadyFulfilled(RequestId),

    /// No pending ticket is linked to this request.
    #[error("KENO_ERR_502: No pending ticket for request {0}")]
    UnknownTicket(RequestId),

    /// Ticket id not found.
    #[error("KENO_ERR_503: Ticket not found: {0}")]
    TicketNotFound(TicketId),

    /// The ticket already left the Pending state.
    #[error("KENO_ERR_504: Ticket {ticket} is {status}, not PENDING")]
    TicketNotPending {
        ticket: TicketId,
        status: TicketStatus,
    },

    /// Unlock requested for a game that is already approved.
    #[error("KENO_ERR_505: Game already approved: {0}")]
    AlreadyApproved(GameId),

    /// Finalization attempted on a game that has no pending request.
    #[error("KENO_ERR_506: Game {game} is {state}, not PENDING_APPROVAL")]
    NotPendingApproval { game: GameId, state: ApprovalState },

    /// Pool accounting invariant violated; critical safety alert.
    #[error("KENO_ERR_507: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("KENO_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("KENO_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("KENO_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("KENO_ERR_903: I/O error: {0}")]
    Io(String),
}

impl KenoError {
    /// Shorthand for an [`KenoError::Unauthorized`] with a formatted reason.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, KenoError>;

impl From<std::io::Error> for KenoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for KenoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
