//! # Game approval: the timelocked admission state machine
//!
//! A game may only draw against pooled collateral once the pool owner has
//! unlocked it for approval **and** a minimum delay has passed. The delay
//! gives stakers an observation window to withdraw before a new game goes
//! live.
//!
//! ## State Machine
//!
//! ```text
//!   UNREQUESTED ──unlock──▶ PENDING_APPROVAL ──finalize(true)──▶ APPROVED
//!                              │        ▲      (after delay)         │
//!              finalize(false) │        │ unlock                     │ revoke
//!                (after delay) ▼        │ (restarts delay)           │ (immediate)
//!                             REVOKED ──┘◀───────────────────────────┘
//! ```
//!
//! Only the initial approval is delayed; revoking a live game is immediate.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::GameId;

/// The lifecycle state of a game's approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalState {
    /// No unlock has ever been requested.
    Unrequested,
    /// Unlock requested; waiting for the delay and the owner's decision.
    PendingApproval,
    /// The game may reserve and escrow against the pool.
    Approved,
    /// The game was denied or its approval withdrawn.
    Revoked,
}

impl ApprovalState {
    /// Can a record in this state move to `target`?
    ///
    /// Timing is not checked here; the registry enforces the delay.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Unrequested | Self::PendingApproval | Self::Revoked,
                Self::PendingApproval
            ) | (Self::PendingApproval, Self::Approved | Self::Revoked)
                | (Self::Approved, Self::Revoked)
        )
    }
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unrequested => write!(f, "UNREQUESTED"),
            Self::PendingApproval => write!(f, "PENDING_APPROVAL"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Revoked => write!(f, "REVOKED"),
        }
    }
}

/// Per-game approval record, owned by the approval registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameApprovalRecord {
    /// The game this record governs.
    pub game: GameId,
    /// When the most recent unlock was requested.
    pub requested_at: Option<DateTime<Utc>>,
    /// Current state.
    pub state: ApprovalState,
}

impl GameApprovalRecord {
    /// A fresh record for a game nobody has asked about yet.
    #[must_use]
    pub fn unrequested(game: GameId) -> Self {
        Self {
            game,
            requested_at: None,
            state: ApprovalState::Unrequested,
        }
    }

    /// Earliest instant at which a pending request may be finalized.
    #[must_use]
    pub fn ready_at(&self, minimum_delay: TimeDelta) -> Option<DateTime<Utc>> {
        self.requested_at.map(|at| at + minimum_delay)
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.state == ApprovalState::Approved
    }
}
