//! Randomness gateway.
//!
//! Games file requests; the configured oracle answers each one at most
//! once. A fulfillment is accepted only if it comes from the oracle account
//! and carries a valid signature over `(request_id, value)`. The requesting
//! game's settlement runs as a callback, and the request is marked
//! FULFILLED only when that callback succeeds.
//!
//! Closed requests are kept until [`RandomnessGateway::prune_closed`] drops
//! them. Ids keep counting up after a prune, so a pruned id is never handed
//! out again and a late answer for it gets `UnknownRequest`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use keno_types::{
    AccountId, Fulfillment, GameId, KenoError, OracleConfig, RandomnessDelivery,
    RandomnessRequest, RequestId, RequestStatus, Result,
};

pub struct RandomnessGateway {
    /// The only account allowed to fulfill.
    oracle: AccountId,
    next_id: RequestId,
    requests: BTreeMap<RequestId, RandomnessRequest>,
}

impl RandomnessGateway {
    #[must_use]
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            oracle: config.oracle,
            next_id: RequestId(1),
            requests: BTreeMap::new(),
        }
    }

    /// Open a new request. Ids start at 1 and are never reused.
    pub fn request_randomness(
        &mut self,
        requester: GameId,
        seed: [u8; 32],
        now: DateTime<Utc>,
    ) -> RequestId {
        let id = self.next_id;
        self.next_id = id.next();
        self.requests.insert(
            id,
            RandomnessRequest {
                id,
                requester,
                seed,
                status: RequestStatus::Open,
                result: None,
                requested_at: now,
            },
        );
        tracing::debug!(request = %id, requester = %requester, "Randomness requested");
        id
    }

    /// Accept the oracle's answer and hand it to `on_fulfilled`.
    ///
    /// Nothing is recorded unless every check passes and `on_fulfilled`
    /// returns `Ok`.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the oracle
    /// - `InvalidOracleSignature` if the signature does not verify
    /// - `UnknownRequest` if no open request has this id
    /// - `AlreadyFulfilled` on replay, `UnknownRequest` once the request is pruned
    /// - whatever `on_fulfilled` returns
    pub fn fulfill<T, F>(
        &mut self,
        caller: AccountId,
        fulfillment: &Fulfillment,
        on_fulfilled: F,
    ) -> Result<T>
    where
        F: FnOnce(&RandomnessDelivery) -> Result<T>,
    {
        let id = fulfillment.request_id;
        if caller != self.oracle {
            tracing::warn!(request = %id, caller = %caller, "Fulfillment from non-oracle rejected");
            return Err(KenoError::unauthorized(format!(
                "{caller} is not the randomness oracle"
            )));
        }
        if !fulfillment.verify(&self.oracle) {
            tracing::warn!(request = %id, "Fulfillment with bad signature rejected");
            return Err(KenoError::InvalidOracleSignature(id));
        }

        let request = self.requests.get(&id).ok_or(KenoError::UnknownRequest(id))?;
        match request.status {
            RequestStatus::Open => {}
            RequestStatus::Fulfilled => {
                tracing::warn!(request = %id, "Replayed fulfillment rejected");
                return Err(KenoError::AlreadyFulfilled(id));
            }
            RequestStatus::Cancelled => return Err(KenoError::UnknownRequest(id)),
        }

        let delivery = RandomnessDelivery {
            request_id: id,
            requester: request.requester,
            value: fulfillment.value,
        };
        let out = on_fulfilled(&delivery)?;

        if let Some(request) = self.requests.get_mut(&id) {
            request.status = RequestStatus::Fulfilled;
            request.result = Some(fulfillment.value);
        }
        tracing::info!(request = %id, value = %fulfillment.value, "Randomness fulfilled");
        Ok(out)
    }

    /// Withdraw an open request. A later fulfillment gets `UnknownRequest`.
    ///
    /// # Errors
    /// - `UnknownRequest` if no open request has this id
    /// - `AlreadyFulfilled` if the oracle already answered
    pub fn cancel(&mut self, request_id: RequestId) -> Result<()> {
        let request = self
            .requests
            .get_mut(&request_id)
            .ok_or(KenoError::UnknownRequest(request_id))?;
        match request.status {
            RequestStatus::Open => {
                request.status = RequestStatus::Cancelled;
                tracing::info!(request = %request_id, "Randomness request cancelled");
                Ok(())
            }
            RequestStatus::Fulfilled => Err(KenoError::AlreadyFulfilled(request_id)),
            RequestStatus::Cancelled => Err(KenoError::UnknownRequest(request_id)),
        }
    }

    #[must_use]
    pub fn request(&self, request_id: RequestId) -> Option<&RandomnessRequest> {
        self.requests.get(&request_id)
    }

    /// Forget fulfilled and cancelled requests; returns how many were removed.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.requests.len();
        self.requests.retain(|_, r| r.is_open());
        let pruned = before - self.requests.len();
        tracing::debug!(
            pruned,
            open = self.requests.len(),
            "Closed randomness requests pruned"
        );
        pruned
    }

    /// Open requests in id order.
    pub fn open_requests(&self) -> impl Iterator<Item = &RandomnessRequest> {
        self.requests.values().filter(|r| r.is_open())
    }

    #[must_use]
    pub fn oracle(&self) -> AccountId {
        self.oracle
    }
}

#[cfg(test)]
mod tests {
    use keno_types::RandomValue;

    use super::*;
    use crate::OracleSigner;

    fn setup() -> (RandomnessGateway, OracleSigner, GameId, DateTime<Utc>) {
        let signer = OracleSigner::from_seed([42; 32]);
        let gateway = RandomnessGateway::new(&OracleConfig {
            oracle: signer.account(),
        });
        (
            gateway,
            signer,
            GameId::from_label("keno"),
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn ids_are_monotonic_from_one() {
        let (mut gw, _, game, now) = setup();
        assert_eq!(gw.request_randomness(game, [0; 32], now), RequestId(1));
        assert_eq!(gw.request_randomness(game, [0; 32], now), RequestId(2));
        assert_eq!(gw.open_requests().count(), 2);
    }

    #[test]
    fn fulfill_runs_callback_once() {
        let (mut gw, signer, game, now) = setup();
        let id = gw.request_randomness(game, [1; 32], now);
        let f = signer.sign(id, RandomValue([7; 32]));

        let got = gw
            .fulfill(signer.account(), &f, |d| {
                assert_eq!(d.requester, game);
                Ok(d.value)
            })
            .unwrap();
        assert_eq!(got, RandomValue([7; 32]));
        let request = gw.request(id).unwrap();
        assert_eq!(request.status, RequestStatus::Fulfilled);
        assert_eq!(request.result, Some(RandomValue([7; 32])));

        let mut ran = false;
        let err = gw
            .fulfill(signer.account(), &f, |_| {
                ran = true;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, KenoError::AlreadyFulfilled(r) if r == id));
        assert!(!ran);
    }

    #[test]
    fn non_oracle_caller_rejected() {
        let (mut gw, signer, game, now) = setup();
        let id = gw.request_randomness(game, [1; 32], now);
        let f = signer.sign(id, RandomValue([7; 32]));
        let err = gw
            .fulfill(AccountId::from_label("mallory"), &f, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, KenoError::Unauthorized { .. }));
        assert!(gw.request(id).unwrap().is_open());
    }

    #[test]
    fn forged_signature_rejected() {
        let (mut gw, signer, game, now) = setup();
        let id = gw.request_randomness(game, [1; 32], now);
        let forger = OracleSigner::random();
        let forged = forger.sign(id, RandomValue([7; 32]));
        let err = gw.fulfill(signer.account(), &forged, |_| Ok(())).unwrap_err();
        assert!(matches!(err, KenoError::InvalidOracleSignature(_)));

        // A valid signature over a different value does not carry over.
        let mut tampered = signer.sign(id, RandomValue([7; 32]));
        tampered.value = RandomValue([8; 32]);
        assert!(matches!(
            gw.fulfill(signer.account(), &tampered, |_| Ok(())),
            Err(KenoError::InvalidOracleSignature(_))
        ));
    }

    #[test]
    fn unknown_request_rejected() {
        let (mut gw, signer, _, _) = setup();
        let f = signer.sign(RequestId(99), RandomValue([7; 32]));
        assert!(matches!(
            gw.fulfill(signer.account(), &f, |_| Ok(())),
            Err(KenoError::UnknownRequest(_))
        ));
    }

    #[test]
    fn failed_callback_leaves_request_open() {
        let (mut gw, signer, game, now) = setup();
        let id = gw.request_randomness(game, [1; 32], now);
        let f = signer.sign(id, RandomValue([7; 32]));

        let err = gw
            .fulfill(signer.account(), &f, |_| -> Result<()> {
                Err(KenoError::Internal("settlement failed".into()))
            })
            .unwrap_err();
        assert!(matches!(err, KenoError::Internal(_)));
        assert!(gw.request(id).unwrap().is_open());

        gw.fulfill(signer.account(), &f, |_| Ok(())).unwrap();
    }

    #[test]
    fn cancelled_request_cannot_be_fulfilled() {
        let (mut gw, signer, game, now) = setup();
        let id = gw.request_randomness(game, [1; 32], now);
        gw.cancel(id).unwrap();
        assert_eq!(gw.request(id).unwrap().status, RequestStatus::Cancelled);
        assert_eq!(gw.open_requests().count(), 0);

        let f = signer.sign(id, RandomValue([7; 32]));
        assert!(matches!(
            gw.fulfill(signer.account(), &f, |_| Ok(())),
            Err(KenoError::UnknownRequest(_))
        ));
        assert!(matches!(gw.cancel(id), Err(KenoError::UnknownRequest(_))));
    }

    #[test]
    fn fulfilled_request_cannot_be_cancelled() {
        let (mut gw, signer, game, now) = setup();
        let id = gw.request_randomness(game, [1; 32], now);
        gw.fulfill(signer.account(), &signer.sign(id, RandomValue([7; 32])), |_| Ok(()))
            .unwrap();
        assert!(matches!(gw.cancel(id), Err(KenoError::AlreadyFulfilled(_))));
    }

    #[test]
    fn prune_keeps_open_requests_and_ids_unique() {
        let (mut gw, signer, game, now) = setup();
        let answered = gw.request_randomness(game, [1; 32], now);
        let withdrawn = gw.request_randomness(game, [2; 32], now);
        let waiting = gw.request_randomness(game, [3; 32], now);
        let answer = signer.sign(answered, RandomValue([7; 32]));
        gw.fulfill(signer.account(), &answer, |_| Ok(())).unwrap();
        gw.cancel(withdrawn).unwrap();

        assert_eq!(gw.prune_closed(), 2);
        assert!(gw.request(answered).is_none());
        assert!(gw.request(withdrawn).is_none());
        assert!(gw.request(waiting).unwrap().is_open());
        assert_eq!(gw.prune_closed(), 0);

        // A pruned request still cannot be answered twice.
        assert!(matches!(
            gw.fulfill(signer.account(), &answer, |_| Ok(())),
            Err(KenoError::UnknownRequest(r)) if r == answered
        ));
        assert_eq!(gw.request_randomness(game, [4; 32], now), RequestId(4));
    }
}
