//! AEROSURE State Management
//!
//! Provides the injected key-value store used as the system of record,
//! per-entity write locks, and the in-process settlement bank.

pub mod bank;
pub mod locks;
pub mod memory;
pub mod store;

pub use bank::*;
pub use locks::*;
pub use memory::*;
pub use store::*;
