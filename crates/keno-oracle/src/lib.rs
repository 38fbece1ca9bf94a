//! # keno-oracle
//!
//! **Randomness Plane**: the gateway between games and the external
//! randomness oracle.
//!
//! ```text
//! game → request_randomness(seed) → RequestId
//! oracle → fulfill(caller, signed Fulfillment) → game callback → FULFILLED
//! ```
//!
//! Every request is answered at most once, and only by the configured
//! oracle key.

pub mod gateway;
pub mod signer;

pub use gateway::RandomnessGateway;
pub use signer::OracleSigner;
