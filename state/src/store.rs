//! Core state store trait and record helpers
//!
//! State is a key-value map; each entity kind lives under its own key
//! prefix and is stored as a bincode record.

use aerosure_core::{AerosureError, AerosureResult, Address, FlightKey};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Abstract state store interface
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &[u8]) -> AerosureResult<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &[u8], value: &[u8]) -> AerosureResult<()>;

    /// Delete a key
    async fn delete(&self, key: &[u8]) -> AerosureResult<()>;

    /// Check if a key exists
    async fn exists(&self, key: &[u8]) -> AerosureResult<bool>;
}

/// Encode a record for storage
pub fn encode_record<T: Serialize>(record: &T) -> AerosureResult<Vec<u8>> {
    bincode::serialize(record).map_err(|e| AerosureError::SerializationError(e.to_string()))
}

/// Decode a stored record
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> AerosureResult<T> {
    bincode::deserialize(bytes).map_err(|e| AerosureError::DeserializationError(e.to_string()))
}

/// Load and decode a record, None when absent
pub async fn get_record<S, T>(store: &S, key: &[u8]) -> AerosureResult<Option<T>>
where
    S: StateStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(bytes) => Ok(Some(decode_record(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and store a record
pub async fn set_record<S, T>(store: &S, key: &[u8], record: &T) -> AerosureResult<()>
where
    S: StateStore + ?Sized,
    T: Serialize + Sync,
{
    store.set(key, &encode_record(record)?).await
}

const AIRLINE_PREFIX: &[u8] = b"airline:";
const ORACLE_PREFIX: &[u8] = b"oracle:";
const POLICY_PREFIX: &[u8] = b"policy:";
const FLIGHT_PREFIX: &[u8] = b"flight:";
const ACCOUNT_PREFIX: &[u8] = b"account:";

fn prefixed(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = prefix.to_vec();
    key.extend_from_slice(suffix);
    key
}

/// Build airline record key
pub fn airline_key(address: &Address) -> Vec<u8> {
    prefixed(AIRLINE_PREFIX, address.as_bytes())
}

/// Build oracle record key
pub fn oracle_key(address: &Address) -> Vec<u8> {
    prefixed(ORACLE_PREFIX, address.as_bytes())
}

/// Build policy record key
pub fn policy_key(id: &[u8]) -> Vec<u8> {
    prefixed(POLICY_PREFIX, id)
}

/// Build flight record key
pub fn flight_record_key(key: &FlightKey) -> Vec<u8> {
    prefixed(FLIGHT_PREFIX, key.as_bytes())
}

/// Build settlement account key
pub fn account_key(address: &Address) -> Vec<u8> {
    prefixed(ACCOUNT_PREFIX, address.as_bytes())
}
