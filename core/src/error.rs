//! Error types for AEROSURE

use thiserror::Error;

/// Main error type for AEROSURE
#[derive(Error, Debug)]
pub enum AerosureError {
    // ============ Validation Errors ============
    #[error("Insufficient registration fee: required {required}, provided {provided}")]
    InsufficientFee { required: u128, provided: u128 },

    #[error("Funding below minimum: required {required}, provided {provided}")]
    BelowMinimumFunding { required: u128, provided: u128 },

    #[error("Premium exceeds cap: cap {cap}, provided {provided}")]
    PremiumExceedsCap { cap: u128, provided: u128 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u8),

    // ============ Authorization Errors ============
    #[error("Caller is not the contract owner")]
    NotOwner,

    #[error("Oracle is not registered")]
    OracleNotRegistered,

    #[error("Airline is not registered")]
    AirlineNotRegistered,

    #[error("Proposer must be a registered and funded airline")]
    ProposerNotEligible,

    #[error("Voter must be a registered airline")]
    VoterNotEligible,

    #[error("Caller does not own this policy")]
    NotPolicyOwner,

    // ============ State Conflict Errors ============
    #[error("Oracle already registered")]
    OracleAlreadyRegistered,

    #[error("Airline already proposed")]
    AirlineAlreadyProposed,

    #[error("Unknown airline")]
    UnknownAirline,

    #[error("Candidate airline is not funded")]
    CandidateNotFunded,

    #[error("No open status request for this flight")]
    RequestNotOpen,

    #[error("Unknown flight")]
    UnknownFlight,

    #[error("Unknown policy")]
    UnknownPolicy,

    #[error("Policy is not eligible for payout")]
    PolicyNotEligible,

    #[error("Policy already claimed")]
    PolicyAlreadyClaimed,

    // ============ Operational Errors ============
    #[error("Contract is not operational")]
    NotOperational,

    // ============ Storage Errors ============
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    // ============ General Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for AerosureError {
    fn from(err: std::io::Error) -> Self {
        AerosureError::StorageError(err.to_string())
    }
}

impl From<bincode::Error> for AerosureError {
    fn from(err: bincode::Error) -> Self {
        AerosureError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for AerosureError {
    fn from(err: serde_json::Error) -> Self {
        AerosureError::SerializationError(err.to_string())
    }
}
