//! Status request routing
//!
//! Each status request is assigned one bucket index from the bounded space;
//! only oracles holding that index may answer. The router owns the request
//! table and applies responses atomically per request.

use crate::response::ResponseTally;
use aerosure_core::{
    AerosureError, AerosureResult, Address, FlightId, FlightKey, OracleIndex, StatusCode,
    Timestamp,
};
use aerosure_crypto::hashing::flight_key;
use aerosure_crypto::indexes::derive_bucket;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Lifecycle of a status request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Accepting responses
    Open,
    /// Terminal: consensus reached on this code
    Finalized(StatusCode),
}

/// An open or finalized status request
#[derive(Debug, Clone)]
pub struct StatusRequest {
    pub flight: FlightId,
    pub bucket: OracleIndex,
    /// Incremented each time the same flight is re-queried after finalization
    pub generation: u64,
    pub opened_at: Timestamp,
    pub status: RequestStatus,
}

impl StatusRequest {
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }
}

/// Request plus its response tally
struct TrackedRequest {
    request: StatusRequest,
    tally: ResponseTally,
}

/// Outcome of opening a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// New request (or re-opened after finalization)
    Opened { bucket: OracleIndex },
    /// An open request already exists; its bucket is reused
    AlreadyOpen { bucket: OracleIndex },
}

impl OpenOutcome {
    pub fn bucket(&self) -> OracleIndex {
        match self {
            OpenOutcome::Opened { bucket } | OpenOutcome::AlreadyOpen { bucket } => *bucket,
        }
    }
}

/// Outcome of submitting a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Counted toward consensus
    Accepted { code: StatusCode, count: usize },
    /// This response crossed the threshold and finalized the request
    Finalized { code: StatusCode },
    /// Harmless no-op; retries surface here rather than as errors
    Ignored(IgnoreReason),
}

/// Why a response was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Submitted index does not match the oracle's set or the request bucket
    IndexMismatch,
    /// Oracle already responded to this request
    DuplicateResponse,
    /// Request reached consensus before this response arrived
    AlreadyFinalized,
}

/// Router and request table
pub struct RequestRouter {
    seed: [u8; 32],
    index_space: u8,
    requests: DashMap<FlightKey, TrackedRequest>,
}

impl RequestRouter {
    pub fn new(seed: [u8; 32], index_space: u8) -> Self {
        Self {
            seed,
            index_space,
            requests: DashMap::new(),
        }
    }

    /// Open a status request for a flight
    ///
    /// A second request for the same flight while one is open reuses the
    /// existing bucket, so one logical request never forks consensus state.
    /// A request for an already-finalized flight re-opens a fresh round
    /// with a new bucket and a cleared tally.
    pub fn open(&self, flight: FlightId) -> (FlightKey, OpenOutcome) {
        let key = flight_key(&flight.airline, &flight.flight, flight.departure);

        let outcome = match self.requests.entry(key) {
            Entry::Vacant(vacant) => {
                let bucket = derive_bucket(&self.seed, &key, 0, self.index_space);
                vacant.insert(TrackedRequest {
                    request: StatusRequest {
                        flight,
                        bucket,
                        generation: 0,
                        opened_at: Timestamp::now(),
                        status: RequestStatus::Open,
                    },
                    tally: ResponseTally::new(),
                });
                OpenOutcome::Opened { bucket }
            }
            Entry::Occupied(mut occupied) => {
                let tracked = occupied.get_mut();
                match tracked.request.status {
                    RequestStatus::Open => OpenOutcome::AlreadyOpen {
                        bucket: tracked.request.bucket,
                    },
                    RequestStatus::Finalized(_) => {
                        let generation = tracked.request.generation + 1;
                        let bucket =
                            derive_bucket(&self.seed, &key, generation, self.index_space);
                        tracked.request = StatusRequest {
                            flight,
                            bucket,
                            generation,
                            opened_at: Timestamp::now(),
                            status: RequestStatus::Open,
                        };
                        tracked.tally.clear();
                        OpenOutcome::Opened { bucket }
                    }
                }
            }
        };

        (key, outcome)
    }

    /// Apply one oracle response under the request's entry lock
    ///
    /// The threshold check runs synchronously against the tally while the
    /// entry is held, so exactly one response can cross it.
    pub fn apply_response(
        &self,
        key: &FlightKey,
        oracle: Address,
        bucket: OracleIndex,
        code: StatusCode,
        threshold: usize,
    ) -> AerosureResult<SubmitOutcome> {
        let mut entry = self
            .requests
            .get_mut(key)
            .ok_or(AerosureError::RequestNotOpen)?;

        match entry.request.status {
            RequestStatus::Finalized(_) => {
                return Ok(SubmitOutcome::Ignored(IgnoreReason::AlreadyFinalized))
            }
            RequestStatus::Open => {}
        }

        if entry.request.bucket != bucket {
            return Ok(SubmitOutcome::Ignored(IgnoreReason::IndexMismatch));
        }

        let count = match entry.tally.record(oracle, code) {
            Some(count) => count,
            None => return Ok(SubmitOutcome::Ignored(IgnoreReason::DuplicateResponse)),
        };

        if count >= threshold {
            entry.request.status = RequestStatus::Finalized(code);
            return Ok(SubmitOutcome::Finalized { code });
        }

        Ok(SubmitOutcome::Accepted { code, count })
    }

    /// Current request state for a flight key
    pub fn get(&self, key: &FlightKey) -> Option<StatusRequest> {
        self.requests.get(key).map(|t| t.request.clone())
    }

    /// Finalized code, if consensus was reached
    pub fn finalized_status(&self, key: &FlightKey) -> Option<StatusCode> {
        self.requests.get(key).and_then(|t| match t.request.status {
            RequestStatus::Finalized(code) => Some(code),
            RequestStatus::Open => None,
        })
    }

    /// Distinct responses counted so far for a request
    pub fn response_count(&self, key: &FlightKey) -> usize {
        self.requests.get(key).map(|t| t.tally.total()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Shared router handle
pub type SharedRouter = Arc<RequestRouter>;
