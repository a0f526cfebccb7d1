//! Configuration types for AEROSURE

use crate::types::Amount;
use serde::{Deserialize, Serialize};

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name for logging
    pub name: String,

    /// Oracle consensus configuration
    pub oracle: OracleConfig,

    /// Airline governance configuration
    pub governance: GovernanceConfig,

    /// Insurance configuration
    pub insurance: InsuranceConfig,

    /// Logging level
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "aerosure-node".to_string(),
            oracle: OracleConfig::default(),
            governance: GovernanceConfig::default(),
            insurance: InsuranceConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Save to JSON file content
    pub fn to_json(&self) -> crate::AerosureResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::AerosureError::SerializationError(e.to_string()))
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> crate::AerosureResult<Self> {
        serde_json::from_str(json).map_err(|e| crate::AerosureError::ConfigError(e.to_string()))
    }
}

/// Oracle registry and status consensus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Fee an oracle pays on registration
    pub registration_fee: Amount,

    /// Size of the bounded index space (buckets 0..index_space)
    pub index_space: u8,

    /// Indexes assigned to each oracle at registration
    pub indexes_per_oracle: u8,

    /// Matching responses required to finalize a status
    pub response_threshold: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            registration_fee: Amount::from_aero(1),
            index_space: 10,
            indexes_per_oracle: 3,
            response_threshold: 3,
        }
    }
}

/// Airline governance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Minimum single payment that counts as funding
    pub min_funding: Amount,

    /// Airline count below which registration is automatic on funding
    pub bootstrap_threshold: usize,

    /// Vote quorum fraction numerator (default 1/2)
    pub quorum_numerator: usize,

    /// Vote quorum fraction denominator
    pub quorum_denominator: usize,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            min_funding: Amount::from_aero(10),
            bootstrap_threshold: 4,
            quorum_numerator: 1,
            quorum_denominator: 2,
        }
    }
}

impl GovernanceConfig {
    /// Distinct votes required to register a candidate:
    /// ceil(registered * numerator / denominator)
    pub fn required_votes(&self, registered: usize) -> usize {
        (registered * self.quorum_numerator + self.quorum_denominator - 1)
            / self.quorum_denominator
    }
}

/// Insurance ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceConfig {
    /// Maximum premium a passenger may pay for one policy
    pub premium_cap: Amount,

    /// Payout as a whole-number percentage of the premium (150 = 1.5x)
    pub payout_multiplier_percent: u32,
}

impl Default for InsuranceConfig {
    fn default() -> Self {
        Self {
            premium_cap: Amount::from_aero(1),
            payout_multiplier_percent: 150,
        }
    }
}
