//! Randomness request/fulfillment model shared by the gateway and the engine.
//!
//! A request is opened by a game, then resolved exactly once by the oracle
//! (FULFILLED) or abandoned by the refund path (CANCELLED). Fulfillments are
//! signed with the oracle's ed25519 key so the gateway can authenticate the
//! caller, not just compare an address.

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::{AccountId, GameId, RequestId};

/// Lifecycle state of a randomness request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Waiting for the oracle.
    Open,
    /// Resolved with a random value. **Irreversible.**
    Fulfilled,
    /// Abandoned after the consumer refunded the ticket.
    Cancelled,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Fulfilled => write!(f, "FULFILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Opaque 256-bit random value delivered by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomValue(pub [u8; 32]);

impl RandomValue {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for RandomValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A randomness request as recorded by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub id: RequestId,
    /// The game that asked for randomness and receives the callback.
    pub requester: GameId,
    /// Correlation seed supplied by the requester.
    pub seed: [u8; 32],
    pub status: RequestStatus,
    /// Present only when FULFILLED.
    pub result: Option<RandomValue>,
    pub requested_at: DateTime<Utc>,
}

impl RandomnessRequest {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }
}

/// Oracle answer to a request, signed by the oracle's key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fulfillment {
    pub request_id: RequestId,
    pub value: RandomValue,
    /// Ed25519 signature over [`Fulfillment::signing_payload`].
    pub signature: Vec<u8>,
}

impl Fulfillment {
    /// Canonical signing payload.
    ///
    /// Format: `"keno:fulfill:v1:" || request_id (le) || value`
    #[must_use]
    pub fn signing_payload(request_id: RequestId, value: &RandomValue) -> Vec<u8> {
        let mut payload = Vec::with_capacity(64);
        payload.extend_from_slice(b"keno:fulfill:v1:");
        payload.extend_from_slice(&request_id.0.to_le_bytes());
        payload.extend_from_slice(value.as_bytes());
        payload
    }

    /// Verify the signature against the oracle's public key.
    #[must_use]
    pub fn verify(&self, oracle: &AccountId) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(oracle.as_bytes()) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&self.signature) else {
            return false;
        };
        key.verify_strict(
            &Self::signing_payload(self.request_id, &self.value),
            &signature,
        )
        .is_ok()
    }
}

/// What the gateway hands to the requesting game once a fulfillment is
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomnessDelivery {
    pub request_id: RequestId,
    pub requester: GameId,
    pub value: RandomValue,
}
