//! Oracle index derivation
//!
//! Indexes shard oracle responsibility: each oracle holds a small set of
//! indexes and may only answer requests routed to one of them. Assignment
//! must be uniformly distributed over the index space and not predictable
//! by an oracle before it registers, so both derivations fold in a seed
//! supplied from external entropy at startup.

use crate::hashing::hash_multiple;
use aerosure_core::{Address, FlightKey, OracleIndex};
use rand::RngCore;

/// Generate a fresh 32-byte seed from OS entropy
pub fn generate_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut seed);
    seed
}

/// Derive one index in `[0, space)` from seed material and a counter
fn derive_one(seed: &[u8; 32], material: &[u8], counter: u64, space: u8) -> OracleIndex {
    let digest = hash_multiple(&[
        b"AEROSURE_INDEX:",
        seed,
        material,
        &counter.to_le_bytes(),
    ]);
    // First 8 bytes reduced mod space; bias is negligible for space <= 10
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    OracleIndex::new((u64::from_le_bytes(word) % space as u64) as u8)
}

/// Derive `count` distinct indexes for an oracle at registration
///
/// Collisions are resampled so each oracle covers `count` distinct shards;
/// `count` must not exceed `space`.
pub fn derive_indexes(
    seed: &[u8; 32],
    actor: &Address,
    space: u8,
    count: u8,
) -> Vec<OracleIndex> {
    debug_assert!(count <= space);

    let mut indexes: Vec<OracleIndex> = Vec::with_capacity(count as usize);
    let mut counter = 0u64;

    while indexes.len() < count as usize {
        let candidate = derive_one(seed, actor.as_bytes(), counter, space);
        counter += 1;
        if !indexes.contains(&candidate) {
            indexes.push(candidate);
        }
    }

    indexes
}

/// Derive the bucket index for a status request
///
/// `generation` distinguishes re-opened requests for the same flight so a
/// fresh round does not land on the same shard every time.
pub fn derive_bucket(
    seed: &[u8; 32],
    flight_key: &FlightKey,
    generation: u64,
    space: u8,
) -> OracleIndex {
    derive_one(seed, flight_key.as_bytes(), generation, space)
}
