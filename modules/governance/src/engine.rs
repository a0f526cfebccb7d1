//! Airline governance engine
//!
//! Drives the Proposed → Funded → Registered state machine against the
//! injected state store. Below the bootstrap threshold funding alone
//! registers an airline; at or above it, registration requires a majority
//! of the registered airlines.

use crate::airline::{Airline, AirlineState};
use aerosure_core::{
    AerosureError, AerosureResult, Address, Amount, GovernanceConfig, GovernanceView,
    SharedGate, Timestamp,
};
use aerosure_state::{airline_key, get_record, set_record, KeyedLocks, StateStore};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Events emitted by the governance engine
#[derive(Debug, Clone)]
pub enum GovernanceEvent {
    /// An airline moved to a new lifecycle state
    StateChanged {
        airline: Address,
        state: AirlineState,
    },
    /// A vote was counted toward a candidate
    VoteRecorded {
        candidate: Address,
        voter: Address,
        votes: usize,
        required: usize,
    },
}

/// Outcome of casting a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Counted, quorum not yet reached
    Counted { votes: usize, required: usize },
    /// This vote tipped the quorum; the candidate is now registered
    Registered,
    /// Voter already voted for this candidate; nothing changed
    Duplicate,
}

/// Airline governance engine
pub struct AirlineGovernance<S: StateStore> {
    store: Arc<S>,
    config: GovernanceConfig,
    gate: SharedGate,
    locks: KeyedLocks,
    registered: RwLock<HashSet<Address>>,
    funded: RwLock<HashSet<Address>>,
    event_tx: Option<mpsc::Sender<GovernanceEvent>>,
}

impl<S: StateStore + 'static> AirlineGovernance<S> {
    pub fn new(store: Arc<S>, config: GovernanceConfig, gate: SharedGate) -> Self {
        Self {
            store,
            config,
            gate,
            locks: KeyedLocks::new(),
            registered: RwLock::new(HashSet::new()),
            funded: RwLock::new(HashSet::new()),
            event_tx: None,
        }
    }

    /// Set event channel
    pub fn set_event_channel(&mut self, tx: mpsc::Sender<GovernanceEvent>) {
        self.event_tx = Some(tx);
    }

    /// Seed the genesis airline
    ///
    /// The very first airline enters Registered directly, with its funding
    /// treated as paid, so the network has a proposer to start from.
    pub async fn seed_genesis(&self, address: Address, name: &str) -> AerosureResult<()> {
        let key = airline_key(&address);
        let _guard = self.locks.lock(&key).await;

        if self.store.exists(&key).await? {
            return Err(AerosureError::AirlineAlreadyProposed);
        }

        let airline = Airline {
            address,
            name: name.to_string(),
            state: AirlineState::Registered,
            funded: self.config.min_funding,
            votes: Default::default(),
            proposed_at: Timestamp::now(),
        };
        set_record(self.store.as_ref(), &key, &airline).await?;

        self.registered.write().insert(address);
        self.funded.write().insert(address);

        info!("Genesis airline seeded: {} ({})", name, address);
        self.emit_event(GovernanceEvent::StateChanged {
            airline: address,
            state: AirlineState::Registered,
        });

        Ok(())
    }

    /// Propose a new airline
    ///
    /// The proposer must itself be registered and funded.
    pub async fn propose(
        &self,
        name: &str,
        candidate: Address,
        proposer: Address,
    ) -> AerosureResult<Airline> {
        self.gate.ensure_operational()?;

        if !self.is_registered(&proposer) || !self.is_funded(&proposer) {
            return Err(AerosureError::ProposerNotEligible);
        }

        let key = airline_key(&candidate);
        let _guard = self.locks.lock(&key).await;

        if self.store.exists(&key).await? {
            return Err(AerosureError::AirlineAlreadyProposed);
        }

        let airline = Airline::proposed(candidate, name);
        set_record(self.store.as_ref(), &key, &airline).await?;

        info!("Airline proposed: {} ({}) by {}", name, candidate, proposer);
        self.emit_event(GovernanceEvent::StateChanged {
            airline: candidate,
            state: AirlineState::Proposed,
        });

        Ok(airline)
    }

    /// Fund a proposed airline
    ///
    /// A single payment below the minimum is rejected outright; nothing is
    /// credited. A payment at or above it moves the airline to Funded and,
    /// while the network is below the bootstrap threshold, straight to
    /// Registered.
    pub async fn fund(&self, candidate: Address, amount: Amount) -> AerosureResult<AirlineState> {
        self.gate.ensure_operational()?;

        if amount < self.config.min_funding {
            return Err(AerosureError::BelowMinimumFunding {
                required: self.config.min_funding.0,
                provided: amount.0,
            });
        }

        let key = airline_key(&candidate);
        let _guard = self.locks.lock(&key).await;

        let mut airline: Airline = get_record(self.store.as_ref(), &key)
            .await?
            .ok_or(AerosureError::UnknownAirline)?;

        let previous = airline.state;
        airline.funded = airline.funded.saturating_add(amount);

        if airline.state == AirlineState::Proposed {
            airline.state = AirlineState::Funded;
            self.funded.write().insert(candidate);

            // Bootstrap: funding alone registers while the network is small
            if self.registered_count() < self.config.bootstrap_threshold {
                airline.state = AirlineState::Registered;
            }
        }
        let state = airline.state;
        set_record(self.store.as_ref(), &key, &airline).await?;

        if state == AirlineState::Registered {
            self.registered.write().insert(candidate);
        }

        info!(
            "Airline funded: {} amount {} now {}",
            candidate, amount, state
        );
        if state != previous {
            self.emit_event(GovernanceEvent::StateChanged {
                airline: candidate,
                state,
            });
        }

        Ok(state)
    }

    /// Cast a vote for a funded candidate
    ///
    /// Duplicate votes are a no-op, not an error, so a retried transaction
    /// cannot double-count. The quorum check runs under the candidate's
    /// lock, so exactly one vote can tip it.
    pub async fn vote(&self, candidate: Address, voter: Address) -> AerosureResult<VoteOutcome> {
        self.gate.ensure_operational()?;

        if !self.is_registered(&voter) {
            return Err(AerosureError::VoterNotEligible);
        }

        let key = airline_key(&candidate);
        let _guard = self.locks.lock(&key).await;

        let mut airline: Airline = get_record(self.store.as_ref(), &key)
            .await?
            .ok_or(AerosureError::UnknownAirline)?;

        if airline.state != AirlineState::Funded {
            return Err(AerosureError::CandidateNotFunded);
        }

        if !airline.votes.insert(voter) {
            debug!("Duplicate vote for {} from {}", candidate, voter);
            return Ok(VoteOutcome::Duplicate);
        }

        let votes = airline.vote_count();
        let required = self.config.required_votes(self.registered_count());

        self.emit_event(GovernanceEvent::VoteRecorded {
            candidate,
            voter,
            votes,
            required,
        });

        if votes >= required {
            airline.state = AirlineState::Registered;
            set_record(self.store.as_ref(), &key, &airline).await?;
            self.registered.write().insert(candidate);

            info!(
                "Airline registered by vote: {} ({}/{})",
                candidate, votes, required
            );
            self.emit_event(GovernanceEvent::StateChanged {
                airline: candidate,
                state: AirlineState::Registered,
            });
            return Ok(VoteOutcome::Registered);
        }

        set_record(self.store.as_ref(), &key, &airline).await?;
        debug!("Vote counted for {}: {}/{}", candidate, votes, required);

        Ok(VoteOutcome::Counted { votes, required })
    }

    /// Load an airline record
    pub async fn airline(&self, address: &Address) -> AerosureResult<Option<Airline>> {
        get_record(self.store.as_ref(), &airline_key(address)).await
    }

    /// Votes required for a candidate at the current network size
    pub fn required_votes(&self) -> usize {
        self.config.required_votes(self.registered_count())
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    fn emit_event(&self, event: GovernanceEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }
}

impl<S: StateStore + 'static> GovernanceView for AirlineGovernance<S> {
    fn is_registered(&self, airline: &Address) -> bool {
        self.registered.read().contains(airline)
    }

    fn is_funded(&self, airline: &Address) -> bool {
        self.funded.read().contains(airline)
    }

    fn registered_count(&self) -> usize {
        self.registered.read().len()
    }
}

/// Shared governance handle
pub type SharedGovernance<S> = Arc<AirlineGovernance<S>>;

/// Create governance event channel
pub fn create_governance_event_channel(
) -> (mpsc::Sender<GovernanceEvent>, mpsc::Receiver<GovernanceEvent>) {
    mpsc::channel(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerosure_core::create_gate;
    use aerosure_state::MemoryStateStore;

    fn addr(n: u8) -> Address {
        Address([n; 32])
    }

    fn setup() -> (AirlineGovernance<MemoryStateStore>, SharedGate) {
        let store = Arc::new(MemoryStateStore::new());
        let gate = create_gate(addr(0));
        let governance = AirlineGovernance::new(store, GovernanceConfig::default(), gate.clone());
        (governance, gate)
    }

    async fn seed(governance: &AirlineGovernance<MemoryStateStore>) -> Address {
        let genesis = addr(1);
        governance.seed_genesis(genesis, "Genesis Air").await.unwrap();
        genesis
    }

    #[tokio::test]
    async fn test_genesis_is_registered_and_funded() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;

        assert!(governance.is_registered(&genesis));
        assert!(governance.is_funded(&genesis));
        assert_eq!(governance.registered_count(), 1);
    }

    #[tokio::test]
    async fn test_propose_requires_eligible_proposer() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;

        // Genesis can propose
        governance.propose("AirFrance", addr(2), genesis).await.unwrap();

        // A merely-proposed airline cannot
        let result = governance.propose("Lauda Air", addr(3), addr(2)).await;
        assert!(matches!(result, Err(AerosureError::ProposerNotEligible)));

        // Neither can a stranger
        let result = governance.propose("RyanAir", addr(4), addr(9)).await;
        assert!(matches!(result, Err(AerosureError::ProposerNotEligible)));
    }

    #[tokio::test]
    async fn test_propose_rejects_duplicate() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;

        governance.propose("AirFrance", addr(2), genesis).await.unwrap();
        let result = governance.propose("AirFrance", addr(2), genesis).await;

        assert!(matches!(result, Err(AerosureError::AirlineAlreadyProposed)));
    }

    #[tokio::test]
    async fn test_fund_unknown_airline() {
        let (governance, _) = setup();
        seed(&governance).await;

        let result = governance.fund(addr(9), Amount::from_aero(10)).await;
        assert!(matches!(result, Err(AerosureError::UnknownAirline)));
    }

    #[tokio::test]
    async fn test_fund_below_minimum_credits_nothing() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;
        governance.propose("AirFrance", addr(2), genesis).await.unwrap();

        let result = governance.fund(addr(2), Amount::from_aero(9)).await;
        assert!(matches!(
            result,
            Err(AerosureError::BelowMinimumFunding { .. })
        ));

        let airline = governance.airline(&addr(2)).await.unwrap().unwrap();
        assert_eq!(airline.funded, Amount::ZERO);
        assert_eq!(airline.state, AirlineState::Proposed);

        // Two half-payments do not add up either
        let result = governance.fund(addr(2), Amount::from_aero(5)).await;
        assert!(matches!(
            result,
            Err(AerosureError::BelowMinimumFunding { .. })
        ));
    }

    #[tokio::test]
    async fn test_fund_auto_registers_below_bootstrap() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;
        governance.propose("AirFrance", addr(2), genesis).await.unwrap();

        let state = governance.fund(addr(2), Amount::from_aero(10)).await.unwrap();

        assert_eq!(state, AirlineState::Registered);
        assert!(governance.is_registered(&addr(2)));
        assert_eq!(governance.registered_count(), 2);

        let airline = governance.airline(&addr(2)).await.unwrap().unwrap();
        assert_eq!(airline.funded, Amount::from_aero(10));
    }

    #[tokio::test]
    async fn test_bootstrap_then_voting_scenario() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;

        // B, C, D fund and auto-register; network reaches the threshold of 4
        for n in 2..=4u8 {
            governance.propose("carrier", addr(n), genesis).await.unwrap();
            let state = governance.fund(addr(n), Amount::from_aero(10)).await.unwrap();
            assert_eq!(state, AirlineState::Registered);
        }
        assert_eq!(governance.registered_count(), 4);

        // E needs ceil(4/2) = 2 distinct votes
        governance.propose("Portugalia", addr(5), genesis).await.unwrap();
        let state = governance.fund(addr(5), Amount::from_aero(10)).await.unwrap();
        assert_eq!(state, AirlineState::Funded);
        assert!(!governance.is_registered(&addr(5)));

        let outcome = governance.vote(addr(5), addr(2)).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Counted { votes: 1, required: 2 });
        assert!(!governance.is_registered(&addr(5)));

        // Same voter again: no-op
        let outcome = governance.vote(addr(5), addr(2)).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Duplicate);
        assert!(!governance.is_registered(&addr(5)));

        // Second distinct voter tips the quorum
        let outcome = governance.vote(addr(5), addr(3)).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Registered);
        assert!(governance.is_registered(&addr(5)));
        assert_eq!(governance.registered_count(), 5);
    }

    #[tokio::test]
    async fn test_vote_requires_registered_voter() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;
        governance.propose("AirFrance", addr(2), genesis).await.unwrap();

        let result = governance.vote(addr(2), addr(9)).await;
        assert!(matches!(result, Err(AerosureError::VoterNotEligible)));
    }

    #[tokio::test]
    async fn test_vote_requires_funded_candidate() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;
        governance.propose("AirFrance", addr(2), genesis).await.unwrap();

        // Still Proposed
        let result = governance.vote(addr(2), genesis).await;
        assert!(matches!(result, Err(AerosureError::CandidateNotFunded)));

        // Unknown candidate
        let result = governance.vote(addr(9), genesis).await;
        assert!(matches!(result, Err(AerosureError::UnknownAirline)));
    }

    #[tokio::test]
    async fn test_cannot_register_without_funding() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;

        // Push the network past bootstrap
        for n in 2..=4u8 {
            governance.propose("carrier", addr(n), genesis).await.unwrap();
            governance.fund(addr(n), Amount::from_aero(10)).await.unwrap();
        }

        governance.propose("Portugalia", addr(5), genesis).await.unwrap();

        // Votes cannot land before funding
        let result = governance.vote(addr(5), addr(2)).await;
        assert!(matches!(result, Err(AerosureError::CandidateNotFunded)));
        assert!(!governance.is_registered(&addr(5)));
    }

    #[tokio::test]
    async fn test_gate_blocks_governance() {
        let (governance, gate) = setup();
        let genesis = seed(&governance).await;

        gate.set_operational(false, addr(0)).unwrap();

        let result = governance.propose("AirFrance", addr(2), genesis).await;
        assert!(matches!(result, Err(AerosureError::NotOperational)));

        let result = governance.fund(addr(2), Amount::from_aero(10)).await;
        assert!(matches!(result, Err(AerosureError::NotOperational)));

        let result = governance.vote(addr(2), genesis).await;
        assert!(matches!(result, Err(AerosureError::NotOperational)));
    }

    #[tokio::test]
    async fn test_registered_is_terminal() {
        let (governance, _) = setup();
        let genesis = seed(&governance).await;
        governance.propose("AirFrance", addr(2), genesis).await.unwrap();
        governance.fund(addr(2), Amount::from_aero(10)).await.unwrap();

        // Voting for an already-registered airline is rejected
        let result = governance.vote(addr(2), genesis).await;
        assert!(matches!(result, Err(AerosureError::CandidateNotFunded)));

        // Additional funding accumulates without a state change
        let state = governance.fund(addr(2), Amount::from_aero(10)).await.unwrap();
        assert_eq!(state, AirlineState::Registered);
        let airline = governance.airline(&addr(2)).await.unwrap().unwrap();
        assert_eq!(airline.funded, Amount::from_aero(20));
    }
}
