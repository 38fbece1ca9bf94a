//! Oracle-side signing of randomness fulfillments.

use ed25519_dalek::{Signer, SigningKey};
use keno_types::{AccountId, Fulfillment, RandomValue, RequestId};

/// Holds the oracle's ed25519 key and signs fulfillments with it.
pub struct OracleSigner {
    key: SigningKey,
}

impl OracleSigner {
    /// Deterministic signer from a 32-byte secret seed.
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// Account the gateway should be configured with.
    #[must_use]
    pub fn account(&self) -> AccountId {
        AccountId::from_pubkey(self.key.verifying_key().to_bytes())
    }

    /// Sign `value` as the answer to `request_id`.
    #[must_use]
    pub fn sign(&self, request_id: RequestId, value: RandomValue) -> Fulfillment {
        let signature = self
            .key
            .sign(&Fulfillment::signing_payload(request_id, &value));
        Fulfillment {
            request_id,
            value,
            signature: signature.to_bytes().to_vec(),
        }
    }
}

/// Random signer for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl OracleSigner {
    pub fn random() -> Self {
        Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_fulfillment_verifies_against_account() {
        let signer = OracleSigner::from_seed([3; 32]);
        let f = signer.sign(RequestId(1), RandomValue([9; 32]));
        assert!(f.verify(&signer.account()));
    }

    #[test]
    fn other_key_does_not_verify() {
        let signer = OracleSigner::from_seed([3; 32]);
        let other = OracleSigner::random();
        let f = signer.sign(RequestId(1), RandomValue([9; 32]));
        assert!(!f.verify(&other.account()));
    }

    #[test]
    fn same_seed_same_account() {
        assert_eq!(
            OracleSigner::from_seed([5; 32]).account(),
            OracleSigner::from_seed([5; 32]).account()
        );
    }
}
