//! Passenger Insurance Module for AEROSURE
//!
//! Implements policy purchase and payout with:
//! - Premium cap enforcement
//! - Payout computation on airline-caused delay
//! - Claim-once settlement through the external ledger collaborator

pub mod ledger;
pub mod policy;

pub use ledger::*;
pub use policy::*;
