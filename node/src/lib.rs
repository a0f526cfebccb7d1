//! AEROSURE Node Implementation
//!
//! Combines all components in one process:
//! - Oracle registry, router, and status consensus
//! - Airline governance
//! - Passenger insurance ledger
//! - Event bridge and in-process oracle simulator

pub mod runtime;
pub mod simulator;

pub use runtime::*;
pub use simulator::*;
