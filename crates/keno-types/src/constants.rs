//! System-wide constants for the Keno pool.

/// Minimum delay between an unlock request and the approval decision (one day).
pub const DEFAULT_APPROVAL_DELAY_SECS: u64 = 86_400;

/// Highest number a player may pick / the draw may produce.
pub const DEFAULT_DRAW_RANGE: u8 = 80;

/// Numbers drawn per ticket.
pub const DEFAULT_DRAW_COUNT: u8 = 20;

/// Maximum spots on a ticket. Tickets hold 1 to 11 numbers, exclusive.
pub const DEFAULT_MAX_SPOTS: u8 = 10;

/// Seconds a ticket may wait for randomness before it becomes refundable.
pub const DEFAULT_REFUND_TIMEOUT_SECS: u64 = 3_600;

/// Default minimum ticket stake, in whole token units.
pub const DEFAULT_MIN_STAKE_UNITS: i64 = 1;

/// Default maximum ticket stake, in whole token units.
pub const DEFAULT_MAX_STAKE_UNITS: i64 = 1_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "UnifiedKeno";
