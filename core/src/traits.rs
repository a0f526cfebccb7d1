//! Core traits defining AEROSURE interfaces
//!
//! These traits are the seams between components: the insurance ledger sees
//! airline standing only through `GovernanceView`, and value transfer only
//! through `SettlementLedger`.

use crate::types::{Address, Amount};
use async_trait::async_trait;

/// Result type for AEROSURE operations
pub type AerosureResult<T> = Result<T, crate::error::AerosureError>;

/// Read-only view of airline standing
///
/// Implemented by the governance engine; consumed by components that must
/// check eligibility without driving lifecycle transitions themselves.
pub trait GovernanceView: Send + Sync {
    /// Airline has completed registration (terminal lifecycle state)
    fn is_registered(&self, airline: &Address) -> bool;

    /// Airline has paid at least the minimum funding
    fn is_funded(&self, airline: &Address) -> bool;

    /// Number of registered airlines
    fn registered_count(&self) -> usize;
}

/// External ledger collaborator executing value transfer
///
/// The core computes payout eligibility and amounts; moving money is the
/// collaborator's job and happens atomically on its side.
#[async_trait]
pub trait SettlementLedger: Send + Sync {
    /// Credit an account with an amount
    async fn credit(&self, account: &Address, amount: Amount) -> AerosureResult<()>;

    /// Current balance of an account
    async fn balance_of(&self, account: &Address) -> AerosureResult<Amount>;
}
