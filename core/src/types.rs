//! Core types for AEROSURE
//!
//! Defines fundamental data structures used across the system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte participant address (airline, oracle, passenger, owner)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Address(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", &self.to_hex()[..16])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

/// 32-byte hash type
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", &self.to_hex()[..16])
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{})", self.to_hex())
    }
}

/// Key identifying one logical flight: hash of (airline, flight code, departure)
pub type FlightKey = Hash;

/// Amount of native currency (in smallest unit)
/// Using u128 for large amounts support
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(u128::MAX);

    /// One AERO = 10^18 smallest units (like ETH wei)
    pub const DECIMALS: u32 = 18;
    pub const ONE_AERO: u128 = 1_000_000_000_000_000_000;

    pub fn new(value: u128) -> Self {
        Amount(value)
    }

    pub fn from_aero(aero: u64) -> Self {
        Amount(aero as u128 * Self::ONE_AERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Scale by a whole-number percentage (150 = 1.5x)
    pub fn percent(self, percent: u32) -> Amount {
        Amount(self.0 / 100 * percent as u128 + self.0 % 100 * percent as u128 / 100)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::ONE_AERO;
        let frac = self.0 % Self::ONE_AERO;
        if frac == 0 {
            write!(f, "{} AERO", whole)
        } else {
            write!(f, "{}.{:018} AERO", whole, frac)
        }
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

/// Timestamp in milliseconds since Unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp_millis() as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Shard identifier in the bounded oracle index space
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OracleIndex(pub u8);

impl OracleIndex {
    pub fn new(value: u8) -> Self {
        OracleIndex(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for OracleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for OracleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OracleIndex({})", self.0)
    }
}

/// Flight status code as reported by oracles
///
/// Wire values are spaced by ten to leave room for carrier-specific
/// sub-codes later.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
#[repr(u8)]
pub enum StatusCode {
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl StatusCode {
    /// Parse a wire code; unknown values map to None
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(StatusCode::Unknown),
            10 => Some(StatusCode::OnTime),
            20 => Some(StatusCode::LateAirline),
            30 => Some(StatusCode::LateWeather),
            40 => Some(StatusCode::LateTechnical),
            50 => Some(StatusCode::LateOther),
            _ => None,
        }
    }

    pub fn as_code(&self) -> u8 {
        *self as u8
    }

    /// Only delays attributable to the airline pay out
    pub fn triggers_payout(&self) -> bool {
        matches!(self, StatusCode::LateAirline)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Unknown => "unknown",
            StatusCode::OnTime => "on-time",
            StatusCode::LateAirline => "late-airline",
            StatusCode::LateWeather => "late-weather",
            StatusCode::LateTechnical => "late-technical",
            StatusCode::LateOther => "late-other",
        };
        write!(f, "{}({})", name, self.as_code())
    }
}

/// One logical flight: operating airline, flight code, scheduled departure
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct FlightId {
    pub airline: Address,
    pub flight: String,
    pub departure: Timestamp,
}

impl FlightId {
    pub fn new(airline: Address, flight: impl Into<String>, departure: Timestamp) -> Self {
        Self {
            airline,
            flight: flight.into(),
            departure,
        }
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} by {}", self.flight, self.departure, self.airline)
    }
}
