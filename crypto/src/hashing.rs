//! Hashing functions using BLAKE3 (with SHA-256 fallback)

use aerosure_core::{Address, FlightKey, Hash, Timestamp};
use sha2::{Digest, Sha256};

/// Compute BLAKE3 hash of data
pub fn blake3_hash(data: &[u8]) -> Hash {
    let hash = blake3::hash(data);
    Hash::from_bytes(*hash.as_bytes())
}

/// Compute SHA-256 hash of data (fallback)
pub fn sha256_hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash::from_bytes(bytes)
}

/// Default hash function (BLAKE3)
pub fn hash(data: &[u8]) -> Hash {
    blake3_hash(data)
}

/// Hash multiple pieces of data
pub fn hash_multiple(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    let hash = hasher.finalize();
    Hash::from_bytes(*hash.as_bytes())
}

/// Compute the key identifying one logical flight
///
/// Two requests for the same (airline, flight, departure) tuple always map
/// to the same key, so consensus state cannot fork across callers.
pub fn flight_key(airline: &Address, flight: &str, departure: Timestamp) -> FlightKey {
    hash_multiple(&[
        b"AEROSURE_FLIGHT:",
        airline.as_bytes(),
        flight.as_bytes(),
        &departure.0.to_le_bytes(),
    ])
}
