//! Flight-status consensus engine
//!
//! Ties the registry and router together: validates who may answer, counts
//! responses, and finalizes a status the instant the threshold is crossed.

use crate::registry::SharedRegistry;
use crate::router::{OpenOutcome, SharedRouter, SubmitOutcome};
use aerosure_core::{
    AerosureResult, Address, FlightId, FlightKey, OracleConfig, OracleIndex, SharedGate,
    StatusCode,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Events emitted by the consensus engine
#[derive(Debug, Clone)]
pub enum FlightEvent {
    /// A status request was opened (or re-announced); oracles holding the
    /// bucket index should report
    RequestOpened {
        flight: FlightId,
        key: FlightKey,
        bucket: OracleIndex,
    },
    /// An individual response was accepted into the tally
    OracleReport {
        key: FlightKey,
        oracle: Address,
        code: StatusCode,
        count: usize,
    },
    /// Consensus reached: the status is now ground truth
    StatusFinalized {
        flight: FlightId,
        key: FlightKey,
        code: StatusCode,
    },
}

/// Consensus engine for flight status
pub struct FlightStatusEngine {
    config: OracleConfig,
    gate: SharedGate,
    registry: SharedRegistry,
    router: SharedRouter,
    event_tx: Option<mpsc::Sender<FlightEvent>>,
}

impl FlightStatusEngine {
    pub fn new(
        config: OracleConfig,
        gate: SharedGate,
        registry: SharedRegistry,
        router: SharedRouter,
    ) -> Self {
        Self {
            config,
            gate,
            registry,
            router,
            event_tx: None,
        }
    }

    /// Set event channel
    pub fn set_event_channel(&mut self, tx: mpsc::Sender<FlightEvent>) {
        self.event_tx = Some(tx);
    }

    /// Open a status request for a flight and announce its bucket
    ///
    /// Idempotent while a request is open: the same bucket is returned and
    /// re-announced, never a second consensus round.
    pub fn request_status(&self, flight: FlightId) -> AerosureResult<(FlightKey, OracleIndex)> {
        self.gate.ensure_operational()?;

        let (key, outcome) = self.router.open(flight.clone());
        let bucket = outcome.bucket();

        match outcome {
            OpenOutcome::Opened { .. } => {
                info!("Status request opened for {} at bucket {}", flight, bucket)
            }
            OpenOutcome::AlreadyOpen { .. } => {
                debug!("Status request re-announced for {} at bucket {}", flight, bucket)
            }
        }

        self.emit_event(FlightEvent::RequestOpened { flight, key, bucket });

        Ok((key, bucket))
    }

    /// Submit one oracle's response for an open request
    ///
    /// Hard errors are reserved for callers that should not be here at all
    /// (unknown request, unregistered oracle); everything an honest retry
    /// can produce comes back as an `Ignored` outcome.
    pub fn submit_response(
        &self,
        oracle: Address,
        key: &FlightKey,
        bucket: OracleIndex,
        code: StatusCode,
    ) -> AerosureResult<SubmitOutcome> {
        self.gate.ensure_operational()?;

        let indexes = self.registry.indexes_of(&oracle)?;
        if !indexes.contains(&bucket) {
            debug!("Response from {} ignored: index {} not assigned", oracle, bucket);
            return Ok(SubmitOutcome::Ignored(
                crate::router::IgnoreReason::IndexMismatch,
            ));
        }

        let outcome = self.router.apply_response(
            key,
            oracle,
            bucket,
            code,
            self.config.response_threshold,
        )?;

        match outcome {
            SubmitOutcome::Accepted { code, count } => {
                debug!(
                    "Response accepted from {} for {}: {} ({}/{})",
                    oracle, key, code, count, self.config.response_threshold
                );
                self.emit_event(FlightEvent::OracleReport {
                    key: *key,
                    oracle,
                    code,
                    count,
                });
            }
            SubmitOutcome::Finalized { code } => {
                info!("Status finalized for {}: {}", key, code);
                self.emit_event(FlightEvent::OracleReport {
                    key: *key,
                    oracle,
                    code,
                    count: self.config.response_threshold,
                });
                if let Some(request) = self.router.get(key) {
                    self.emit_event(FlightEvent::StatusFinalized {
                        flight: request.flight,
                        key: *key,
                        code,
                    });
                }
            }
            SubmitOutcome::Ignored(reason) => {
                debug!("Response from {} ignored: {:?}", oracle, reason);
            }
        }

        Ok(outcome)
    }

    /// Finalized code for a flight key, if consensus was reached
    pub fn finalized_status(&self, key: &FlightKey) -> Option<StatusCode> {
        self.router.finalized_status(key)
    }

    fn emit_event(&self, event: FlightEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }
}

/// Shared engine handle
pub type SharedEngine = Arc<FlightStatusEngine>;

/// Create flight event channel
pub fn create_flight_event_channel() -> (mpsc::Sender<FlightEvent>, mpsc::Receiver<FlightEvent>) {
    mpsc::channel(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::OracleRegistry;
    use crate::router::{IgnoreReason, RequestRouter};
    use aerosure_core::{create_gate, AerosureError, Amount, Timestamp};

    struct Harness {
        engine: FlightStatusEngine,
        registry: SharedRegistry,
        gate: SharedGate,
        events: mpsc::Receiver<FlightEvent>,
    }

    fn setup() -> Harness {
        let config = OracleConfig::default();
        let gate = create_gate(Address([0u8; 32]));
        let seed = [13u8; 32];
        let registry = Arc::new(OracleRegistry::new(config.clone(), gate.clone(), seed));
        let router = Arc::new(RequestRouter::new(seed, config.index_space));

        let (tx, events) = create_flight_event_channel();
        let mut engine =
            FlightStatusEngine::new(config, gate.clone(), registry.clone(), router);
        engine.set_event_channel(tx);

        Harness {
            engine,
            registry,
            gate,
            events,
        }
    }

    fn flight() -> FlightId {
        FlightId::new(
            Address([7u8; 32]),
            "LA459",
            Timestamp::from_millis(1_630_021_956_000),
        )
    }

    /// Register oracles until `want` of them hold `bucket`
    fn matching_oracles(harness: &Harness, bucket: OracleIndex, want: usize) -> Vec<Address> {
        let mut matching = Vec::new();
        for i in 1..=200u8 {
            let actor = Address([i; 32]);
            let oracle = harness
                .registry
                .register(actor, Amount::from_aero(1))
                .unwrap();
            if oracle.has_index(bucket) {
                matching.push(actor);
                if matching.len() == want {
                    break;
                }
            }
        }
        assert_eq!(matching.len(), want, "index space too unlucky");
        matching
    }

    #[test]
    fn test_consensus_scenario() {
        let harness = setup();
        let (key, bucket) = harness.engine.request_status(flight()).unwrap();

        let oracles = matching_oracles(&harness, bucket, 4);

        // Three distinct oracles report late-airline
        for (i, oracle) in oracles[..3].iter().enumerate() {
            let outcome = harness
                .engine
                .submit_response(*oracle, &key, bucket, StatusCode::LateAirline)
                .unwrap();
            if i < 2 {
                assert!(matches!(outcome, SubmitOutcome::Accepted { count, .. } if count == i + 1));
            } else {
                assert_eq!(
                    outcome,
                    SubmitOutcome::Finalized {
                        code: StatusCode::LateAirline
                    }
                );
            }
        }

        assert_eq!(
            harness.engine.finalized_status(&key),
            Some(StatusCode::LateAirline)
        );

        // A fourth oracle is too late
        let late = harness
            .engine
            .submit_response(oracles[3], &key, bucket, StatusCode::LateAirline)
            .unwrap();
        assert_eq!(late, SubmitOutcome::Ignored(IgnoreReason::AlreadyFinalized));
    }

    #[test]
    fn test_unregistered_oracle_rejected() {
        let harness = setup();
        let (key, bucket) = harness.engine.request_status(flight()).unwrap();

        let result = harness.engine.submit_response(
            Address([99u8; 32]),
            &key,
            bucket,
            StatusCode::OnTime,
        );
        assert!(matches!(result, Err(AerosureError::OracleNotRegistered)));
    }

    #[test]
    fn test_unassigned_index_ignored() {
        let harness = setup();
        let (key, bucket) = harness.engine.request_status(flight()).unwrap();

        // Find an oracle that does NOT hold the bucket
        let mut outsider = None;
        for i in 1..=200u8 {
            let actor = Address([i; 32]);
            let oracle = harness
                .registry
                .register(actor, Amount::from_aero(1))
                .unwrap();
            if !oracle.has_index(bucket) {
                outsider = Some(actor);
                break;
            }
        }
        let outsider = outsider.expect("all oracles hold the bucket");

        let outcome = harness
            .engine
            .submit_response(outsider, &key, bucket, StatusCode::OnTime)
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Ignored(IgnoreReason::IndexMismatch));
    }

    #[test]
    fn test_duplicate_response_ignored() {
        let harness = setup();
        let (key, bucket) = harness.engine.request_status(flight()).unwrap();
        let oracle = matching_oracles(&harness, bucket, 1)[0];

        harness
            .engine
            .submit_response(oracle, &key, bucket, StatusCode::OnTime)
            .unwrap();
        let dup = harness
            .engine
            .submit_response(oracle, &key, bucket, StatusCode::OnTime)
            .unwrap();

        assert_eq!(dup, SubmitOutcome::Ignored(IgnoreReason::DuplicateResponse));
    }

    #[test]
    fn test_gate_blocks_submission() {
        let harness = setup();
        let (key, bucket) = harness.engine.request_status(flight()).unwrap();
        let oracle = matching_oracles(&harness, bucket, 1)[0];

        harness
            .gate
            .set_operational(false, Address([0u8; 32]))
            .unwrap();

        let result = harness
            .engine
            .submit_response(oracle, &key, bucket, StatusCode::OnTime);
        assert!(matches!(result, Err(AerosureError::NotOperational)));

        let request = harness.engine.request_status(flight());
        assert!(matches!(request, Err(AerosureError::NotOperational)));
    }

    #[test]
    fn test_events_emitted() {
        let mut harness = setup();
        let (key, bucket) = harness.engine.request_status(flight()).unwrap();

        match harness.events.try_recv().unwrap() {
            FlightEvent::RequestOpened {
                key: event_key,
                bucket: event_bucket,
                ..
            } => {
                assert_eq!(event_key, key);
                assert_eq!(event_bucket, bucket);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let oracles = matching_oracles(&harness, bucket, 3);
        for oracle in &oracles {
            harness
                .engine
                .submit_response(*oracle, &key, bucket, StatusCode::LateAirline)
                .unwrap();
        }

        let mut saw_finalized = false;
        while let Ok(event) = harness.events.try_recv() {
            if let FlightEvent::StatusFinalized { code, .. } = event {
                assert_eq!(code, StatusCode::LateAirline);
                saw_finalized = true;
            }
        }
        assert!(saw_finalized);
    }
}
