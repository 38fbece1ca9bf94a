//! Identifiers used throughout the Keno pool.
//!
//! Accounts and games are 32-byte addresses (an account is the raw ed25519
//! public key of its holder), tickets use UUIDv7 for time-ordered sorting,
//! and randomness requests use a monotonic counter.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

fn labelled_address(domain: &[u8], label: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(label.as_bytes());
    hasher.finalize().into()
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of a token holder: staker, player, pool owner, or oracle.
/// This is the raw ed25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic address for accounts that hold no signing key of their
    /// own (the pool vault, fixtures).
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self(labelled_address(b"keno:account:v1:", label))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// GameId
// ---------------------------------------------------------------------------

/// Address of a game contract that may be approved to draw on the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct GameId(pub [u8; 32]);

impl GameId {
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self(labelled_address(b"keno:game:v1:", label))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// TicketId
// ---------------------------------------------------------------------------

/// Globally unique ticket identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TicketId(pub Uuid);

impl TicketId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier of a randomness request.
/// Never reused, even after the request is fulfilled or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

/// Random fixtures for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_accounts_are_deterministic() {
        assert_eq!(AccountId::from_label("pool"), AccountId::from_label("pool"));
        assert_ne!(AccountId::from_label("pool"), AccountId::from_label("owner"));
    }

    #[test]
    fn account_and_game_domains_differ() {
        let account = AccountId::from_label("keno");
        let game = GameId::from_label("keno");
        assert_ne!(account.as_bytes(), game.as_bytes());
    }

    #[test]
    fn ticket_id_ordering() {
        let a = TicketId::new();
        let b = TicketId::new();
        assert!(a < b);
    }

    #[test]
    fn request_id_next() {
        assert_eq!(RequestId(5).next(), RequestId(6));
    }

    #[test]
    fn display_prefixes() {
        assert!(AccountId::random().to_string().starts_with("acct:"));
        assert!(GameId::from_label("keno").to_string().starts_with("game:"));
        assert_eq!(RequestId(3).to_string(), "req:3");
        assert_eq!(AccountId::from_label("x").short().len(), 8);
    }

    #[test]
    fn serde_roundtrips() {
        let tid = TicketId::new();
        let json = serde_json::to_string(&tid).unwrap();
        let back: TicketId = serde_json::from_str(&json).unwrap();
        assert_eq!(tid, back);

        let game = GameId::from_label("keno");
        let json = serde_json::to_string(&game).unwrap();
        let back: GameId = serde_json::from_str(&json).unwrap();
        assert_eq!(game, back);
    }
}
