//! Provider Resilience Core service binary.
//!
//! The resilience core of a call-center platform: it owns the provider
//! configuration schemas, the test/activate workflow, and the per-slot
//! circuit breakers that decide whether live call traffic may reach a
//! third-party provider (telephony trunks, voice gateways, LLM vendors).
//!
//! # Architecture Overview
//!
//! ```text
//!   Dashboard UI / CLI / SDK
//!          │  bearer-authenticated HTTP
//!          ▼
//!   ┌────────────────────────────────────────────────────┐
//!   │                 provider-gate                       │
//!   │                                                     │
//!   │  http ──▶ workflow ──▶ form ──▶ schema (catalog)    │
//!   │    │          │                                     │
//!   │    │          ├──▶ probe (live connectivity)        │
//!   │    │          └──▶ store (persisted configuration)  │
//!   │    │                                                │
//!   │    ├──▶ breaker (CLOSED / OPEN / HALF_OPEN)         │
//!   │    └──▶ health  (snapshots + failover indicator)    │
//!   │                                                     │
//!   │  cross-cutting: config, observability, lifecycle    │
//!   └────────────────────────────────────────────────────┘
//!          │  probes / persistence
//!          ▼
//!   provider endpoints, platform backend
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use provider_gate::config::loader::load_config;
use provider_gate::{ApiServer, GateConfig, Shutdown};

#[derive(Parser)]
#[command(name = "provider-gate")]
#[command(about = "Provider configuration and circuit-breaker service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provider_gate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "provider-gate starting");

    let args = Args::parse();
    let config = match args.config {
        Some(path) => load_config(&path)?,
        None => GateConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        slots = config.slots.len(),
        failure_threshold = config.breaker.failure_threshold,
        cooldown_secs = config.breaker.cooldown_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            provider_gate::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    shutdown.trigger_on_ctrl_c();

    let server = ApiServer::new(config)?;
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
