//! # keno-engine
//!
//! **Game Plane**: Keno tickets from purchase to payout.
//!
//! ## Architecture
//!
//! 1. **KenoEngine**: validates purchases, escrows stakes, reserves the
//!    maximum payout, and settles tickets when randomness arrives
//! 2. **Draw**: SHA-256 counter-mode stream with rejection sampling and a
//!    partial Fisher-Yates shuffle
//! 3. **KenoHouse**: owns pool, gateway, engine, and clock behind one API
//!
//! ## Settlement Flow
//!
//! ```text
//! oracle → RandomnessGateway.fulfill() → KenoEngine.on_randomness_fulfilled()
//!        → draw_numbers() → pay table → CollateralPool.{collect_escrow, settle, release}
//! ```

pub mod draw;
pub mod engine;
pub mod house;

pub use draw::{DrawStream, draw_numbers};
pub use engine::KenoEngine;
pub use house::KenoHouse;
