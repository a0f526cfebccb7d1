//! Node runtime combining all components
//!
//! Owns the shared store, gate, and engines, and bridges their event
//! channels onto one broadcast bus: consumers (oracle actors, dashboards)
//! subscribe instead of being hardcoded callers. The bridge feeds finalized
//! flight statuses into the insurance ledger before rebroadcasting them.

use aerosure_core::{
    create_gate, Address, GovernanceView, NodeConfig, SettlementLedger, SharedGate,
};
use aerosure_crypto::indexes::generate_seed;
use aerosure_governance::{
    create_governance_event_channel, AirlineGovernance, GovernanceEvent,
};
use aerosure_insurance::InsuranceLedger;
use aerosure_oracle::{
    create_flight_event_channel, FlightEvent, FlightStatusEngine, OracleRegistry, RequestRouter,
};
use aerosure_state::{create_memory_store, MemoryBank, MemoryStateStore};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

/// Everything the node publishes, on one bus
#[derive(Debug, Clone)]
pub enum BusEvent {
    Flight(FlightEvent),
    Governance(GovernanceEvent),
}

/// Node runtime managing all components
pub struct NodeRuntime {
    config: NodeConfig,
    gate: SharedGate,
    store: Arc<MemoryStateStore>,
    bank: Arc<MemoryBank<MemoryStateStore>>,
    registry: Arc<OracleRegistry>,
    router: Arc<RequestRouter>,
    engine: Arc<FlightStatusEngine>,
    governance: Arc<AirlineGovernance<MemoryStateStore>>,
    insurance: Arc<InsuranceLedger<MemoryStateStore>>,
    bus: broadcast::Sender<BusEvent>,
}

impl NodeRuntime {
    /// Build the runtime and start its event bridges
    ///
    /// Must be called from within a Tokio runtime; the bridges are spawned
    /// immediately.
    pub fn start(config: NodeConfig, owner: Address) -> Arc<Self> {
        let gate = create_gate(owner);
        let store = create_memory_store();
        let bank = Arc::new(MemoryBank::new(store.clone()));

        let seed = generate_seed();
        let registry = Arc::new(OracleRegistry::new(
            config.oracle.clone(),
            gate.clone(),
            seed,
        ));
        let router = Arc::new(RequestRouter::new(seed, config.oracle.index_space));

        let (flight_tx, flight_rx) = create_flight_event_channel();
        let mut engine = FlightStatusEngine::new(
            config.oracle.clone(),
            gate.clone(),
            registry.clone(),
            router.clone(),
        );
        engine.set_event_channel(flight_tx);
        let engine = Arc::new(engine);

        let (governance_tx, governance_rx) = create_governance_event_channel();
        let mut governance =
            AirlineGovernance::new(store.clone(), config.governance.clone(), gate.clone());
        governance.set_event_channel(governance_tx);
        let governance = Arc::new(governance);

        let insurance = Arc::new(InsuranceLedger::new(
            store.clone(),
            config.insurance.clone(),
            gate.clone(),
            governance.clone() as Arc<dyn GovernanceView>,
            bank.clone() as Arc<dyn SettlementLedger>,
        ));

        let (bus, _) = broadcast::channel(256);
        Self::spawn_bridges(flight_rx, governance_rx, insurance.clone(), bus.clone());

        Arc::new(Self {
            config,
            gate,
            store,
            bank,
            registry,
            router,
            engine,
            governance,
            insurance,
            bus,
        })
    }

    fn spawn_bridges(
        mut flight_rx: mpsc::Receiver<FlightEvent>,
        mut governance_rx: mpsc::Receiver<GovernanceEvent>,
        insurance: Arc<InsuranceLedger<MemoryStateStore>>,
        bus: broadcast::Sender<BusEvent>,
    ) {
        let flight_bus = bus.clone();
        tokio::spawn(async move {
            while let Some(event) = flight_rx.recv().await {
                if let FlightEvent::StatusFinalized { key, code, .. } = &event {
                    // Payouts are marked before the finalization is rebroadcast,
                    // so a subscriber seeing the event can claim immediately
                    if let Err(e) = insurance.on_flight_finalized(*key, *code).await {
                        warn!("Payout marking failed for {}: {}", key, e);
                    }
                }
                let _ = flight_bus.send(BusEvent::Flight(event));
            }
        });

        tokio::spawn(async move {
            while let Some(event) = governance_rx.recv().await {
                let _ = bus.send(BusEvent::Governance(event));
            }
        });
    }

    /// Subscribe to the event bus
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.bus.subscribe()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn gate(&self) -> &SharedGate {
        &self.gate
    }

    pub fn store(&self) -> &Arc<MemoryStateStore> {
        &self.store
    }

    pub fn bank(&self) -> &Arc<MemoryBank<MemoryStateStore>> {
        &self.bank
    }

    pub fn registry(&self) -> &Arc<OracleRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Arc<RequestRouter> {
        &self.router
    }

    pub fn engine(&self) -> &Arc<FlightStatusEngine> {
        &self.engine
    }

    pub fn governance(&self) -> &Arc<AirlineGovernance<MemoryStateStore>> {
        &self.governance
    }

    pub fn insurance(&self) -> &Arc<InsuranceLedger<MemoryStateStore>> {
        &self.insurance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerosure_core::{Amount, FlightId, OracleIndex, SettlementLedger, Timestamp};
    use aerosure_crypto::hashing::flight_key;
    use aerosure_oracle::SubmitOutcome;
    use aerosure_core::StatusCode;
    use std::time::Duration;

    fn addr(n: u8) -> Address {
        Address([n; 32])
    }

    /// Register oracles until `want` of them hold `bucket`
    fn matching_oracles(
        runtime: &Arc<NodeRuntime>,
        bucket: OracleIndex,
        want: usize,
    ) -> Vec<Address> {
        let mut matching = Vec::new();
        for i in 50..=250 {
            let mut bytes = [0u8; 32];
            bytes[0] = (i % 256) as u8;
            bytes[1] = (i / 256) as u8;
            let actor = Address(bytes);
            let oracle = runtime
                .registry()
                .register(actor, Amount::from_aero(1))
                .unwrap();
            if oracle.has_index(bucket) {
                matching.push(actor);
                if matching.len() == want {
                    break;
                }
            }
        }
        assert_eq!(matching.len(), want, "index space too unlucky");
        matching
    }

    #[tokio::test]
    async fn test_end_to_end_payout() {
        let owner = addr(0);
        let runtime = NodeRuntime::start(NodeConfig::default(), owner);

        // Governance: genesis airline
        let genesis = addr(1);
        runtime
            .governance()
            .seed_genesis(genesis, "Genesis Air")
            .await
            .unwrap();

        // Flight listed by the genesis airline
        let departure = Timestamp::from_millis(1_630_021_956_000);
        let flight = FlightId::new(genesis, "LA459", departure);
        let key = flight_key(&genesis, "LA459", departure);
        runtime
            .insurance()
            .register_flight(key, flight.clone(), genesis)
            .await
            .unwrap();

        // Passenger buys a 0.5 AERO policy
        let passenger = addr(8);
        let premium = Amount::new(Amount::ONE_AERO / 2);
        let policy = runtime
            .insurance()
            .buy(key, passenger, premium)
            .await
            .unwrap();

        // Consensus: three matching oracles report late-airline
        let mut bus = runtime.subscribe();
        let (request_key, bucket) = runtime.engine().request_status(flight).unwrap();
        assert_eq!(request_key, key);

        let oracles = matching_oracles(&runtime, bucket, 3);
        for oracle in &oracles {
            let outcome = runtime
                .engine()
                .submit_response(*oracle, &key, bucket, StatusCode::LateAirline)
                .unwrap();
            assert!(!matches!(outcome, SubmitOutcome::Ignored(_)));
        }

        // The bridge marks payouts before rebroadcasting finalization
        let finalized = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match bus.recv().await {
                    Ok(BusEvent::Flight(FlightEvent::StatusFinalized { code, .. })) => {
                        break code
                    }
                    Ok(_) => continue,
                    Err(e) => panic!("bus closed: {}", e),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(finalized, StatusCode::LateAirline);

        // Claim pays 0.75 AERO through the settlement ledger
        let paid = runtime.insurance().claim(policy.id, passenger).await.unwrap();
        assert_eq!(paid, Amount::new(Amount::ONE_AERO / 4 * 3));
        assert_eq!(
            runtime.bank().balance_of(&passenger).await.unwrap(),
            Amount::new(Amount::ONE_AERO / 4 * 3)
        );
    }

    #[tokio::test]
    async fn test_governance_events_on_bus() {
        let runtime = NodeRuntime::start(NodeConfig::default(), addr(0));
        let mut bus = runtime.subscribe();

        runtime
            .governance()
            .seed_genesis(addr(1), "Genesis Air")
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), bus.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event,
            BusEvent::Governance(GovernanceEvent::StateChanged { .. })
        ));
    }

    #[tokio::test]
    async fn test_gate_stops_the_world() {
        let owner = addr(0);
        let runtime = NodeRuntime::start(NodeConfig::default(), owner);
        runtime
            .governance()
            .seed_genesis(addr(1), "Genesis Air")
            .await
            .unwrap();

        runtime.gate().set_operational(false, owner).unwrap();

        assert!(runtime
            .registry()
            .register(addr(9), Amount::from_aero(1))
            .is_err());
        assert!(runtime
            .governance()
            .propose("AirFrance", addr(2), addr(1))
            .await
            .is_err());

        runtime.gate().set_operational(true, owner).unwrap();
        assert!(runtime
            .registry()
            .register(addr(9), Amount::from_aero(1))
            .is_ok());
    }
}
