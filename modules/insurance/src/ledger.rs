//! Insurance ledger
//!
//! Records passenger policies against flight keys, reacts to finalized
//! flight statuses, and settles claims through the external ledger
//! collaborator. Mutations for one flight are serialized through its key
//! lock, so a claim can never race the payout marking.

use crate::policy::{Policy, PolicyId, PolicyStatus};
use aerosure_core::{
    AerosureError, AerosureResult, Address, Amount, FlightId, FlightKey, GovernanceView,
    InsuranceConfig, SettlementLedger, SharedGate, StatusCode,
};
use aerosure_state::{flight_record_key, get_record, policy_key, set_record, KeyedLocks, StateStore};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Insurance ledger over the injected state store
pub struct InsuranceLedger<S: StateStore> {
    store: Arc<S>,
    config: InsuranceConfig,
    gate: SharedGate,
    governance: Arc<dyn GovernanceView>,
    settlement: Arc<dyn SettlementLedger>,
    locks: KeyedLocks,
    flights: DashMap<FlightKey, FlightId>,
    policies_by_flight: DashMap<FlightKey, Vec<PolicyId>>,
}

impl<S: StateStore + 'static> InsuranceLedger<S> {
    pub fn new(
        store: Arc<S>,
        config: InsuranceConfig,
        gate: SharedGate,
        governance: Arc<dyn GovernanceView>,
        settlement: Arc<dyn SettlementLedger>,
    ) -> Self {
        Self {
            store,
            config,
            gate,
            governance,
            settlement,
            locks: KeyedLocks::new(),
            flights: DashMap::new(),
            policies_by_flight: DashMap::new(),
        }
    }

    /// Register a flight so passengers can insure it
    ///
    /// Only a registered airline may list flights. Re-registering an
    /// existing flight is a no-op returning the same key.
    pub async fn register_flight(
        &self,
        key: FlightKey,
        flight: FlightId,
        caller: Address,
    ) -> AerosureResult<FlightKey> {
        self.gate.ensure_operational()?;

        if !self.governance.is_registered(&caller) {
            return Err(AerosureError::AirlineNotRegistered);
        }

        if self.flights.insert(key, flight.clone()).is_none() {
            set_record(self.store.as_ref(), &flight_record_key(&key), &flight).await?;
            info!("Flight registered: {} key {}", flight, key);
        }

        Ok(key)
    }

    /// Buy a policy for a registered flight
    pub async fn buy(
        &self,
        flight_key: FlightKey,
        passenger: Address,
        premium: Amount,
    ) -> AerosureResult<Policy> {
        self.gate.ensure_operational()?;

        if !self.flights.contains_key(&flight_key) {
            return Err(AerosureError::UnknownFlight);
        }
        if premium.is_zero() {
            return Err(AerosureError::InvalidAmount("premium must be positive".into()));
        }
        if premium > self.config.premium_cap {
            return Err(AerosureError::PremiumExceedsCap {
                cap: self.config.premium_cap.0,
                provided: premium.0,
            });
        }

        let payout = premium.percent(self.config.payout_multiplier_percent);
        let policy = Policy::new(flight_key, passenger, premium, payout);

        let _guard = self.locks.lock(flight_key.as_bytes()).await;
        set_record(
            self.store.as_ref(),
            &policy_key(policy.id.as_bytes()),
            &policy,
        )
        .await?;
        self.policies_by_flight
            .entry(flight_key)
            .or_default()
            .push(policy.id);

        info!(
            "Policy {} bought by {} on {}: premium {} payout {}",
            policy.id, passenger, flight_key, premium, payout
        );

        Ok(policy)
    }

    /// React to a finalized flight status
    ///
    /// On an airline-caused delay every active policy on the flight becomes
    /// payable; any other code leaves policies untouched. Returns the number
    /// of policies marked.
    pub async fn on_flight_finalized(
        &self,
        flight_key: FlightKey,
        code: StatusCode,
    ) -> AerosureResult<usize> {
        self.gate.ensure_operational()?;

        if !code.triggers_payout() {
            debug!("Flight {} finalized {}: no payout", flight_key, code);
            return Ok(0);
        }

        let _guard = self.locks.lock(flight_key.as_bytes()).await;

        let ids: Vec<PolicyId> = self
            .policies_by_flight
            .get(&flight_key)
            .map(|ids| ids.clone())
            .unwrap_or_default();

        let mut marked = 0;
        for id in ids {
            let key = policy_key(id.as_bytes());
            let mut policy: Policy = match get_record(self.store.as_ref(), &key).await? {
                Some(policy) => policy,
                None => continue,
            };
            if policy.status == PolicyStatus::Active {
                policy.status = PolicyStatus::Payable;
                set_record(self.store.as_ref(), &key, &policy).await?;
                marked += 1;
            }
        }

        info!(
            "Flight {} finalized {}: {} policies payable",
            flight_key, code, marked
        );

        Ok(marked)
    }

    /// Claim a payable policy
    ///
    /// Marks the policy claimed, then credits the payout through the
    /// settlement ledger. Terminal: a second claim surfaces as
    /// `PolicyAlreadyClaimed`.
    pub async fn claim(&self, id: PolicyId, passenger: Address) -> AerosureResult<Amount> {
        self.gate.ensure_operational()?;

        let key = policy_key(id.as_bytes());
        let mut policy: Policy = get_record(self.store.as_ref(), &key)
            .await?
            .ok_or(AerosureError::UnknownPolicy)?;

        let _guard = self.locks.lock(policy.flight_key.as_bytes()).await;

        // Re-read under the lock: status may have moved since the unlocked read
        policy = get_record(self.store.as_ref(), &key)
            .await?
            .ok_or(AerosureError::UnknownPolicy)?;

        if policy.passenger != passenger {
            return Err(AerosureError::NotPolicyOwner);
        }
        match policy.status {
            PolicyStatus::Active => return Err(AerosureError::PolicyNotEligible),
            PolicyStatus::Claimed => return Err(AerosureError::PolicyAlreadyClaimed),
            PolicyStatus::Payable => {}
        }

        policy.status = PolicyStatus::Claimed;
        set_record(self.store.as_ref(), &key, &policy).await?;

        self.settlement.credit(&passenger, policy.payout).await?;

        info!("Policy {} claimed by {}: {}", id, passenger, policy.payout);

        Ok(policy.payout)
    }

    /// Load a policy record
    pub async fn policy(&self, id: &PolicyId) -> AerosureResult<Option<Policy>> {
        get_record(self.store.as_ref(), &policy_key(id.as_bytes())).await
    }

    /// All policies recorded against a flight
    pub async fn policies_for(&self, flight_key: &FlightKey) -> AerosureResult<Vec<Policy>> {
        let ids: Vec<PolicyId> = self
            .policies_by_flight
            .get(flight_key)
            .map(|ids| ids.clone())
            .unwrap_or_default();

        let mut policies = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(policy) = self.policy(&id).await? {
                policies.push(policy);
            }
        }
        Ok(policies)
    }

    /// Registered flight lookup
    pub fn flight(&self, key: &FlightKey) -> Option<FlightId> {
        self.flights.get(key).map(|f| f.clone())
    }

    pub fn config(&self) -> &InsuranceConfig {
        &self.config
    }
}

/// Shared insurance ledger handle
pub type SharedInsurance<S> = Arc<InsuranceLedger<S>>;
