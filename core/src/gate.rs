//! Process-wide operational gate
//!
//! A single boolean switch, settable only by the owner, that short-circuits
//! every mutating operation while it is down. Components check it first and
//! fail fast rather than queueing work.

use crate::error::AerosureError;
use crate::traits::AerosureResult;
use crate::types::Address;
use parking_lot::RwLock;
use std::sync::Arc;

/// Operational flag with owner-only toggle
pub struct OperationalGate {
    owner: Address,
    operational: RwLock<bool>,
}

impl OperationalGate {
    /// Create a gate owned by `owner`, initially operational
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            operational: RwLock::new(true),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_operational(&self) -> bool {
        *self.operational.read()
    }

    /// Toggle the flag. The one mutation allowed while the gate is down.
    pub fn set_operational(&self, value: bool, caller: Address) -> AerosureResult<()> {
        if caller != self.owner {
            return Err(AerosureError::NotOwner);
        }
        *self.operational.write() = value;
        Ok(())
    }

    /// Precondition for every mutating operation
    pub fn ensure_operational(&self) -> AerosureResult<()> {
        if !self.is_operational() {
            return Err(AerosureError::NotOperational);
        }
        Ok(())
    }
}

/// Shared gate handle
pub type SharedGate = Arc<OperationalGate>;

/// Create a shared gate
pub fn create_gate(owner: Address) -> SharedGate {
    Arc::new(OperationalGate::new(owner))
}
