//! AEROSURE Hashing and Index Derivation
//!
//! Provides content hashing (flight keys) and the deterministic-but-
//! unpredictable index assignment used to shard oracle responsibility.

pub mod hashing;
pub mod indexes;

pub use hashing::*;
pub use indexes::*;
