//! Airline lifecycle types

use aerosure_core::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Airline lifecycle state; Registered is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirlineState {
    Proposed,
    Funded,
    Registered,
}

impl fmt::Display for AirlineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AirlineState::Proposed => "proposed",
            AirlineState::Funded => "funded",
            AirlineState::Registered => "registered",
        };
        write!(f, "{}", name)
    }
}

/// Stored airline record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    pub address: Address,
    pub name: String,
    pub state: AirlineState,
    pub funded: Amount,
    /// Distinct voters who approved this candidate; membership drives
    /// duplicate-vote rejection
    pub votes: BTreeSet<Address>,
    pub proposed_at: Timestamp,
}

impl Airline {
    /// New candidate entering the lifecycle
    pub fn proposed(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            state: AirlineState::Proposed,
            funded: Amount::ZERO,
            votes: BTreeSet::new(),
            proposed_at: Timestamp::now(),
        }
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    pub fn is_registered(&self) -> bool {
        self.state == AirlineState::Registered
    }

    pub fn is_funded(&self) -> bool {
        matches!(self.state, AirlineState::Funded | AirlineState::Registered)
            && !self.funded.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposed_airline_starts_clean() {
        let airline = Airline::proposed(Address([1u8; 32]), "Lauda Air");

        assert_eq!(airline.state, AirlineState::Proposed);
        assert_eq!(airline.funded, Amount::ZERO);
        assert_eq!(airline.vote_count(), 0);
        assert!(!airline.is_registered());
        assert!(!airline.is_funded());
    }

    #[test]
    fn test_vote_set_deduplicates() {
        let mut airline = Airline::proposed(Address([1u8; 32]), "RyanAir");
        let voter = Address([2u8; 32]);

        assert!(airline.votes.insert(voter));
        assert!(!airline.votes.insert(voter));
        assert_eq!(airline.vote_count(), 1);
    }

    #[test]
    fn test_record_round_trip() {
        let mut airline = Airline::proposed(Address([1u8; 32]), "Portugalia");
        airline.state = AirlineState::Funded;
        airline.funded = Amount::from_aero(10);
        airline.votes.insert(Address([2u8; 32]));

        let bytes = bincode::serialize(&airline).unwrap();
        let restored: Airline = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored.state, AirlineState::Funded);
        assert_eq!(restored.funded, Amount::from_aero(10));
        assert_eq!(restored.vote_count(), 1);
    }
}
