//! keygate server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                     KEYGATE                      │
//!                     │                                                  │
//!   Client Request    │  ┌───────────┐   ┌─────────────┐   ┌──────────┐  │
//!   ──────────────────┼─▶│ tower-http│──▶│ interceptor │──▶│ handlers │  │
//!                     │  │ id/trace  │   │ (blocked?)  │   │          │  │
//!                     │  └───────────┘   └──────┬──────┘   └────┬─────┘  │
//!                     │                         │               │        │
//!                     │                         ▼               ▼        │
//!                     │                  ┌─────────────┐  ┌───────────┐  │
//!                     │                  │ RateLimiter │  │ Identity  │  │
//!                     │                  │   ledger    │  │ Resolver  │  │
//!                     │                  └─────────────┘  └─────┬─────┘  │
//!                     │                                         ▼        │
//!                     │                                  ┌───────────┐   │
//!                     │                                  │ Identity  │   │
//!                     │                                  │  Store    │   │
//!                     │                                  └───────────┘   │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use keygate::auth::MemoryIdentityStore;
use keygate::config::{load_config, GatewayConfig};
use keygate::lifecycle::{startup, Shutdown};
use keygate::observability::logging;

#[derive(Parser)]
#[command(name = "keygate")]
#[command(about = "API key authentication gateway", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "keygate starting");

    let store = Arc::new(MemoryIdentityStore::new());
    let (server, listener) = startup::prepare(config, store).await?;

    let shutdown = Shutdown::new();
    let _signals = shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
