//! # keno-pool
//!
//! **Collateral Plane**: the unified liquidity pool every approved game
//! draws against.
//!
//! ## Architecture
//!
//! 1. **TokenLedger**: seam to the external fungible token
//! 2. **ApprovalRegistry**: timelocked admission of games (unlock, wait, decide)
//! 3. **CollateralPool**: stakes, bankroll, per-game escrow and reservations
//! 4. **PoolAccounting**: vault balance vs recorded flows
//!
//! ## Ticket Flow Through the Pool
//!
//! ```text
//! escrow(stake) → reserve(max payout) → ... randomness ...
//!     → collect_escrow(stake) → settle(payout) → release(rest)
//! ```
//!
//! A game may only escrow or reserve while **approved**.

pub mod accounting;
pub mod ledger;
pub mod pool;
pub mod registry;

pub use accounting::PoolAccounting;
pub use ledger::{TokenBalances, TokenLedger};
pub use pool::CollateralPool;
pub use registry::ApprovalRegistry;
