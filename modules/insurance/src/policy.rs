//! Insurance policy types

use aerosure_core::{Address, Amount, FlightKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Policy identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub Uuid);

impl PolicyId {
    pub fn generate() -> Self {
        PolicyId(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyId({})", self.0)
    }
}

/// Settlement state of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyStatus {
    /// Bought, flight outcome unknown
    Active,
    /// Flight finalized late-airline; payout awaits the passenger's claim
    Payable,
    /// Paid out; terminal
    Claimed,
}

/// Stored policy record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub flight_key: FlightKey,
    pub passenger: Address,
    pub premium: Amount,
    /// Precomputed at purchase: premium scaled by the payout multiplier
    pub payout: Amount,
    pub status: PolicyStatus,
    pub bought_at: Timestamp,
}

impl Policy {
    pub fn new(
        flight_key: FlightKey,
        passenger: Address,
        premium: Amount,
        payout: Amount,
    ) -> Self {
        Self {
            id: PolicyId::generate(),
            flight_key,
            passenger,
            premium,
            payout,
            status: PolicyStatus::Active,
            bought_at: Timestamp::now(),
        }
    }
}
