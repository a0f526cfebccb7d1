//! AEROSURE Node Binary
//!
//! Runs a self-contained demo of the full settlement flow: governance
//! bootstrap, oracle fleet registration, policy purchase, status consensus,
//! and payout claim.

use aerosure_core::{
    Amount, FlightId, GovernanceView, NodeConfig, SettlementLedger, StatusCode, Timestamp,
};
use aerosure_crypto::hashing::flight_key;
use aerosure_node::{
    count_matching, random_address, spawn_oracle_fleet, BusEvent, NodeRuntime,
};
use aerosure_oracle::FlightEvent;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aerosure-node")]
#[command(about = "AEROSURE - Decentralized flight-delay insurance")]
#[command(version)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulated oracles to spawn
    #[arg(long, default_value_t = 40)]
    oracles: usize,

    /// Flight code to insure and query
    #[arg(long, default_value = "LA459")]
    flight: String,

    /// Status code the simulated oracles report
    #[arg(long, default_value_t = 20)]
    status: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => NodeConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => NodeConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let code = StatusCode::from_code(cli.status)
        .ok_or(aerosure_core::AerosureError::InvalidStatusCode(cli.status))?;

    info!("Starting {} demo scenario", config.name);
    let owner = random_address();
    let runtime = NodeRuntime::start(config, owner);

    // Governance bootstrap: genesis plus three funded carriers, then a
    // fifth that needs votes
    let genesis = random_address();
    runtime.governance().seed_genesis(genesis, "Genesis Air").await?;

    let carriers = ["AirFrance", "Lauda Air", "RyanAir"];
    let mut registered = Vec::new();
    for name in carriers {
        let carrier = random_address();
        runtime.governance().propose(name, carrier, genesis).await?;
        runtime
            .governance()
            .fund(carrier, Amount::from_aero(10))
            .await?;
        registered.push(carrier);
    }
    info!(
        "Network bootstrapped with {} registered airlines",
        runtime.governance().registered_count()
    );

    let candidate = random_address();
    runtime
        .governance()
        .propose("Portugalia", candidate, genesis)
        .await?;
    runtime
        .governance()
        .fund(candidate, Amount::from_aero(10))
        .await?;
    for voter in &registered[..2] {
        runtime.governance().vote(candidate, *voter).await?;
    }
    info!(
        "Portugalia registered by vote: {}",
        runtime.governance().registered_count()
    );

    // A passenger insures the flight
    let departure = Timestamp::now();
    let flight = FlightId::new(genesis, cli.flight.clone(), departure);
    let key = flight_key(&genesis, &cli.flight, departure);
    runtime
        .insurance()
        .register_flight(key, flight.clone(), genesis)
        .await?;

    let passenger = random_address();
    let premium = Amount::new(Amount::ONE_AERO / 2);
    let policy = runtime.insurance().buy(key, passenger, premium).await?;
    info!("Policy {} bought: premium {}", policy.id, premium);

    // Oracle fleet comes online, then the status request fans out
    let fleet = spawn_oracle_fleet(&runtime, cli.oracles, code).await?;

    let mut bus = runtime.subscribe();
    let (_, bucket) = runtime.engine().request_status(flight)?;
    info!(
        "Request at bucket {}: {} of {} oracles hold it",
        bucket,
        count_matching(&fleet, bucket),
        fleet.len()
    );

    let finalized = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(BusEvent::Flight(FlightEvent::StatusFinalized { code, .. })) =
                bus.recv().await
            {
                break code;
            }
        }
    })
    .await;

    match finalized {
        Ok(code) => {
            info!("Flight status finalized: {}", code);
            if code.triggers_payout() {
                let paid = runtime.insurance().claim(policy.id, passenger).await?;
                info!(
                    "Claim settled: {} (balance {})",
                    paid,
                    runtime.bank().balance_of(&passenger).await?
                );
            } else {
                info!("No payout for this status");
            }
        }
        Err(_) => warn!(
            "No consensus within timeout; {} oracles held bucket {}",
            count_matching(&fleet, bucket),
            bucket
        ),
    }

    Ok(())
}
