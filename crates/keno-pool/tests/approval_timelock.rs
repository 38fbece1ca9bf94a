//! Integration tests for the approval timelock in front of pooled collateral.
//!
//! A game must be unlocked by the owner, wait out the full delay, and be
//! approved before it can touch the pool. Revocation is immediate, and
//! re-admission restarts the wait.

use chrono::{DateTime, TimeDelta, Utc};
use keno_pool::{CollateralPool, TokenBalances, TokenLedger};
use keno_types::*;
use rust_decimal::Decimal;

const DAY: i64 = 86_400;

/// Helper: pool with a funded staker and a clock the test advances.
struct PoolHarness {
    pool: CollateralPool,
    owner: AccountId,
    staker: AccountId,
    game: GameId,
    clock: ManualClock,
}

impl PoolHarness {
    fn new() -> Self {
        let owner = AccountId::from_label("owner");
        let staker = AccountId::from_label("staker");
        let mut ledger = TokenBalances::new();
        ledger.mint(staker, Decimal::new(5_000, 0));

        let mut pool = CollateralPool::new(&PoolConfig::new(owner), ledger).unwrap();
        let clock = ManualClock::new(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap());
        pool.stake(staker, Decimal::new(1_000, 0), clock.now())
            .unwrap();

        Self {
            pool,
            owner,
            staker,
            game: GameId::from_label("keno"),
            clock,
        }
    }

    fn unlock(&mut self) -> Result<()> {
        self.pool
            .unlock_game_for_approval(self.owner, self.game, self.clock.now())
    }

    fn decide(&mut self, approve: bool) -> Result<ApprovalState> {
        self.pool
            .change_game_approval(self.owner, self.game, approve, self.clock.now())
    }
}

#[test]
fn full_admission_cycle() {
    let mut h = PoolHarness::new();
    assert!(matches!(
        h.pool.reserve(h.game, Decimal::ONE),
        Err(KenoError::GameNotApproved(_))
    ));

    h.unlock().unwrap();
    h.clock.advance_secs(DAY);
    assert_eq!(h.decide(true).unwrap(), ApprovalState::Approved);

    h.pool.reserve(h.game, Decimal::new(250, 0)).unwrap();
    assert_eq!(h.pool.free_collateral(), Decimal::new(750, 0));
    h.pool.verify_accounting().unwrap();
}

#[test]
fn approval_one_second_early_is_rejected_then_succeeds() {
    let mut h = PoolHarness::new();
    h.unlock().unwrap();

    h.clock.advance_secs(DAY - 1);
    let err = h.decide(true).unwrap_err();
    match err {
        KenoError::DelayNotElapsed { game, ready_at } => {
            assert_eq!(game, h.game);
            assert_eq!(ready_at, h.clock.now() + TimeDelta::seconds(1));
        }
        other => panic!("Expected DelayNotElapsed, got: {other:?}"),
    }
    assert_eq!(h.pool.registry().state(h.game), ApprovalState::PendingApproval);

    h.clock.advance_secs(1);
    assert_eq!(h.decide(true).unwrap(), ApprovalState::Approved);
}

#[test]
fn approval_without_unlock_is_rejected() {
    let mut h = PoolHarness::new();
    h.clock.advance_secs(10 * DAY);
    assert!(matches!(
        h.decide(true),
        Err(KenoError::NotPendingApproval { .. })
    ));
}

#[test]
fn stranger_cannot_drive_the_registry() {
    let mut h = PoolHarness::new();
    let stranger = h.staker;
    let now = h.clock.now();
    assert!(matches!(
        h.pool.unlock_game_for_approval(stranger, h.game, now),
        Err(KenoError::Unauthorized { .. })
    ));
    h.unlock().unwrap();
    h.clock.advance_secs(DAY);
    let now = h.clock.now();
    assert!(matches!(
        h.pool.change_game_approval(stranger, h.game, true, now),
        Err(KenoError::Unauthorized { .. })
    ));
    assert!(!h.pool.registry().is_approved(h.game));
}

#[test]
fn revocation_is_immediate_and_readmission_waits_again() {
    let mut h = PoolHarness::new();
    h.unlock().unwrap();
    h.clock.advance_secs(DAY);
    h.decide(true).unwrap();

    h.pool.revoke_game(h.owner, h.game).unwrap();
    assert!(matches!(
        h.pool.escrow(h.game, h.staker, Decimal::ONE),
        Err(KenoError::GameNotApproved(_))
    ));

    h.unlock().unwrap();
    h.clock.advance_secs(DAY / 2);
    assert!(matches!(
        h.decide(true),
        Err(KenoError::DelayNotElapsed { .. })
    ));
    h.clock.advance_secs(DAY / 2);
    h.decide(true).unwrap();
    h.pool.escrow(h.game, h.staker, Decimal::ONE).unwrap();
}

#[test]
fn denied_game_never_touches_collateral() {
    let mut h = PoolHarness::new();
    h.unlock().unwrap();
    h.clock.advance_secs(DAY);
    assert_eq!(h.decide(false).unwrap(), ApprovalState::Revoked);

    assert!(matches!(
        h.pool.reserve(h.game, Decimal::ONE),
        Err(KenoError::GameNotApproved(_))
    ));
    assert!(matches!(
        h.pool.settle(h.game, h.staker, Decimal::ONE),
        Err(KenoError::Unauthorized { .. })
    ));
    assert_eq!(h.pool.holdings(), Decimal::new(1_000, 0));
    assert_eq!(
        h.pool.ledger().balance_of(h.staker),
        Decimal::new(4_000, 0)
    );
}

#[test]
fn stakers_exit_only_from_free_collateral() {
    let mut h = PoolHarness::new();
    h.unlock().unwrap();
    h.clock.advance_secs(DAY);
    h.decide(true).unwrap();

    h.pool.reserve(h.game, Decimal::new(900, 0)).unwrap();
    assert!(matches!(
        h.pool.unstake(h.staker, Decimal::new(200, 0)),
        Err(KenoError::PoolLocked { .. })
    ));

    // Even after revocation the reservation stays locked until released.
    h.pool.revoke_game(h.owner, h.game).unwrap();
    assert!(matches!(
        h.pool.unstake(h.staker, Decimal::new(200, 0)),
        Err(KenoError::PoolLocked { .. })
    ));
    h.pool.release(h.game, Decimal::new(900, 0)).unwrap();
    h.pool.unstake(h.staker, Decimal::new(1_000, 0)).unwrap();

    assert!(h.pool.holdings().is_zero());
    h.pool.verify_accounting().unwrap();
}
