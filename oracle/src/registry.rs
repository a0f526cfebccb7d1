//! Oracle registry
//!
//! Tracks registered oracle actors and the index set assigned to each at
//! registration time. Index sets are fixed for the life of the oracle;
//! deregistration does not exist.

use aerosure_core::{
    AerosureError, AerosureResult, Address, Amount, OracleConfig, OracleIndex, SharedGate,
    Timestamp,
};
use aerosure_crypto::indexes::derive_indexes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// A registered oracle actor
#[derive(Debug, Clone)]
pub struct Oracle {
    pub address: Address,
    /// Distinct indexes this oracle may answer for, in assignment order
    pub indexes: Vec<OracleIndex>,
    pub registered_at: Timestamp,
}

impl Oracle {
    pub fn has_index(&self, index: OracleIndex) -> bool {
        self.indexes.contains(&index)
    }
}

/// Registry of oracle actors
pub struct OracleRegistry {
    config: OracleConfig,
    gate: SharedGate,
    seed: [u8; 32],
    oracles: DashMap<Address, Oracle>,
}

impl OracleRegistry {
    /// Create a registry; `seed` feeds index derivation and must come from
    /// external entropy so assignments are not predictable in advance
    pub fn new(config: OracleConfig, gate: SharedGate, seed: [u8; 32]) -> Self {
        Self {
            config,
            gate,
            seed,
            oracles: DashMap::new(),
        }
    }

    /// Register an oracle actor
    ///
    /// The fee must meet the configured registration fee; each actor may
    /// register once.
    pub fn register(&self, actor: Address, fee_paid: Amount) -> AerosureResult<Oracle> {
        self.gate.ensure_operational()?;

        if fee_paid < self.config.registration_fee {
            return Err(AerosureError::InsufficientFee {
                required: self.config.registration_fee.0,
                provided: fee_paid.0,
            });
        }

        match self.oracles.entry(actor) {
            Entry::Occupied(_) => Err(AerosureError::OracleAlreadyRegistered),
            Entry::Vacant(vacant) => {
                let indexes = derive_indexes(
                    &self.seed,
                    &actor,
                    self.config.index_space,
                    self.config.indexes_per_oracle,
                );
                let oracle = Oracle {
                    address: actor,
                    indexes,
                    registered_at: Timestamp::now(),
                };

                info!("Oracle registered: {} indexes {:?}", actor, oracle.indexes);

                vacant.insert(oracle.clone());
                Ok(oracle)
            }
        }
    }

    /// Indexes assigned to an oracle
    pub fn indexes_of(&self, actor: &Address) -> AerosureResult<Vec<OracleIndex>> {
        self.oracles
            .get(actor)
            .map(|o| o.indexes.clone())
            .ok_or(AerosureError::OracleNotRegistered)
    }

    pub fn is_registered(&self, actor: &Address) -> bool {
        self.oracles.contains_key(actor)
    }

    pub fn get(&self, actor: &Address) -> Option<Oracle> {
        self.oracles.get(actor).map(|o| o.clone())
    }

    pub fn count(&self) -> usize {
        self.oracles.len()
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }
}

/// Shared registry handle
pub type SharedRegistry = Arc<OracleRegistry>;
