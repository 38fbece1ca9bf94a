//! Game approval registry: the timelock in front of pooled collateral.
//!
//! A game goes live only after the pool owner unlocks it **and** the
//! minimum delay has elapsed. The delay is an explicit comparison against
//! the captured `requested_at`, re-evaluated on every call: finalizing
//! early is a deterministic rejection, never a wait.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use keno_types::{AccountId, ApprovalState, GameApprovalRecord, GameId, KenoError, Result};

/// Per-game approval records plus the owner and delay that govern them.
pub struct ApprovalRegistry {
    /// The only account allowed to unlock, finalize, or revoke.
    owner: AccountId,
    /// Mandatory wait between unlock and decision.
    minimum_delay: TimeDelta,
    /// Records keyed by game. Absent means UNREQUESTED.
    records: HashMap<GameId, GameApprovalRecord>,
}

impl ApprovalRegistry {
    #[must_use]
    pub fn new(owner: AccountId, minimum_delay: TimeDelta) -> Self {
        Self {
            owner,
            minimum_delay,
            records: HashMap::new(),
        }
    }

    fn ensure_owner(&self, caller: AccountId) -> Result<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(KenoError::unauthorized(format!(
                "{caller} is not the pool owner"
            )))
        }
    }

    /// Open (or restart) the approval window for `game`.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the owner
    /// - `AlreadyApproved` if the game is live
    pub fn unlock_for_approval(
        &mut self,
        caller: AccountId,
        game: GameId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        let state = self.state(game);
        if !state.can_transition_to(ApprovalState::PendingApproval) {
            return Err(KenoError::AlreadyApproved(game));
        }

        self.records.insert(
            game,
            GameApprovalRecord {
                game,
                requested_at: Some(now),
                state: ApprovalState::PendingApproval,
            },
        );

        tracing::info!(
            game = %game,
            previous = %state,
            ready_at = %(now + self.minimum_delay),
            "Game unlocked for approval"
        );
        Ok(())
    }

    /// Approve or deny a pending game once the delay has elapsed.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the owner
    /// - `NotPendingApproval` if no unlock is pending
    /// - `DelayNotElapsed` if `now < requested_at + minimum_delay`
    pub fn finalize_approval(
        &mut self,
        caller: AccountId,
        game: GameId,
        approve: bool,
        now: DateTime<Utc>,
    ) -> Result<ApprovalState> {
        self.ensure_owner(caller)?;
        let delay = self.minimum_delay;
        let state = self.state(game);
        if state != ApprovalState::PendingApproval {
            return Err(KenoError::NotPendingApproval { game, state });
        }
        let record = self
            .records
            .get_mut(&game)
            .ok_or(KenoError::NotPendingApproval { game, state })?;

        let ready_at = record.ready_at(delay).ok_or_else(|| {
            KenoError::Internal(format!("pending record for {game} has no request time"))
        })?;
        if now < ready_at {
            tracing::debug!(
                game = %game,
                ready_at = %ready_at,
                now = %now,
                "Approval finalized too early"
            );
            return Err(KenoError::DelayNotElapsed { game, ready_at });
        }

        record.state = if approve {
            ApprovalState::Approved
        } else {
            ApprovalState::Revoked
        };

        tracing::info!(game = %game, state = %record.state, "Game approval finalized");
        Ok(record.state)
    }

    /// Pull a live game immediately. No delay applies to revocation.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the owner
    /// - `GameNotApproved` if the game is not live
    pub fn revoke(&mut self, caller: AccountId, game: GameId) -> Result<()> {
        self.ensure_owner(caller)?;
        let record = self
            .records
            .get_mut(&game)
            .filter(|r| r.is_approved())
            .ok_or(KenoError::GameNotApproved(game))?;

        record.state = ApprovalState::Revoked;
        tracing::warn!(game = %game, "Game approval revoked");
        Ok(())
    }

    /// Current state of `game`.
    #[must_use]
    pub fn state(&self, game: GameId) -> ApprovalState {
        self.records
            .get(&game)
            .map_or(ApprovalState::Unrequested, |r| r.state)
    }

    #[must_use]
    pub fn is_approved(&self, game: GameId) -> bool {
        self.state(game) == ApprovalState::Approved
    }

    /// Guard for operations that require a live game.
    ///
    /// # Errors
    /// Returns `GameNotApproved` unless the game is APPROVED.
    pub fn ensure_approved(&self, game: GameId) -> Result<()> {
        if self.is_approved(game) {
            Ok(())
        } else {
            Err(KenoError::GameNotApproved(game))
        }
    }

    /// Full record for `game`, if an unlock was ever requested.
    #[must_use]
    pub fn record(&self, game: GameId) -> Option<&GameApprovalRecord> {
        self.records.get(&game)
    }

    #[must_use]
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    #[must_use]
    pub fn minimum_delay(&self) -> TimeDelta {
        self.minimum_delay
    }
}
