//! In-process oracle simulator
//!
//! Spawns oracle actors that behave like the external fleet: each registers
//! against the live registry, watches the event bus, and answers any request
//! routed to one of its assigned indexes. Useful for demos and end-to-end
//! tests of the consensus path.

use crate::runtime::{BusEvent, NodeRuntime};
use aerosure_core::{AerosureResult, Address, OracleIndex, StatusCode};
use aerosure_oracle::FlightEvent;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Handle describing one spawned oracle actor
#[derive(Debug, Clone)]
pub struct SimulatedOracle {
    pub address: Address,
    pub indexes: Vec<OracleIndex>,
}

impl SimulatedOracle {
    pub fn has_index(&self, index: OracleIndex) -> bool {
        self.indexes.contains(&index)
    }
}

/// Spawn `count` oracle actors that all report `code`
///
/// Every actor pays the configured registration fee, then loops on the bus:
/// on `RequestOpened` it submits its response iff the bucket is one of its
/// indexes. Rejections and ignores are logged, never retried into errors.
pub async fn spawn_oracle_fleet(
    runtime: &Arc<NodeRuntime>,
    count: usize,
    code: StatusCode,
) -> AerosureResult<Vec<SimulatedOracle>> {
    let fee = runtime.config().oracle.registration_fee;
    let mut fleet = Vec::with_capacity(count);

    for n in 0..count {
        let address = random_address();
        let oracle = runtime.registry().register(address, fee)?;
        let handle = SimulatedOracle {
            address,
            indexes: oracle.indexes.clone(),
        };
        fleet.push(handle.clone());

        let engine = runtime.engine().clone();
        let mut bus = runtime.subscribe();
        tokio::spawn(async move {
            loop {
                let event = match bus.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Oracle {} lagged {} events", handle.address, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                if let BusEvent::Flight(FlightEvent::RequestOpened { key, bucket, .. }) = event {
                    if !handle.has_index(bucket) {
                        continue;
                    }
                    match engine.submit_response(handle.address, &key, bucket, code) {
                        Ok(outcome) => {
                            debug!("Oracle {} responded to {}: {:?}", handle.address, key, outcome)
                        }
                        Err(e) => warn!("Oracle {} response failed: {}", handle.address, e),
                    }
                }
            }
        });

        debug!("Simulated oracle {} of {} spawned: {}", n + 1, count, address);
    }

    Ok(fleet)
}

/// How many fleet members hold a bucket index
pub fn count_matching(fleet: &[SimulatedOracle], bucket: OracleIndex) -> usize {
    fleet.iter().filter(|o| o.has_index(bucket)).count()
}

/// Fresh random actor address from OS entropy
pub fn random_address() -> Address {
    Address::from_bytes(rand::random())
}
