//! # keno-types
//!
//! Shared types, errors, and configuration for the unified-pool **Keno**.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`GameId`], [`TicketId`], [`RequestId`]
//! - **Approval model**: [`ApprovalState`], [`GameApprovalRecord`]
//! - **Stake model**: [`Stake`]
//! - **Ticket model**: [`Ticket`], [`TicketStatus`], [`TicketSelection`], [`Settlement`]
//! - **Randomness model**: [`RandomnessRequest`], [`RequestStatus`], [`RandomValue`], [`Fulfillment`]
//! - **Pay table**: [`PayTable`]
//! - **Configuration**: [`HouseConfig`], [`PoolConfig`], [`KenoConfig`], [`OracleConfig`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Errors**: [`KenoError`] with `KENO_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod approval;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod paytable;
pub mod randomness;
pub mod stake;
pub mod ticket;

// Re-export all primary types at crate root for ergonomic imports:
//   use keno_types::{Ticket, GameId, KenoError, ...};

pub use approval::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use paytable::*;
pub use randomness::*;
pub use stake::*;
pub use ticket::*;

// Constants are accessed via `keno_types::constants::FOO`
// (not re-exported to avoid name collisions).
