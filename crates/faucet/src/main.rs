//! Faucet service binary

use anyhow::Context;
use apex_chain::{HttpNodeClient, KeyPair, LedgerNode};
use apex_faucet::api::{
    claim_handler, health_handler, metrics_handler, root_handler, status_handler, AppState,
};
use apex_faucet::ledger::EligibilityLedger;
use apex_faucet::service::Dispenser;
use apex_faucet::{metrics, FaucetConfig};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Faucet service CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server address
    #[arg(long)]
    server_addr: Option<String>,

    /// RPC URL of the ledger node
    #[arg(long)]
    rpc_url: Option<String>,

    /// Eligibility ledger path
    #[arg(long)]
    db_path: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a funding keypair and print it
    GenerateKey,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let env_filter = if args.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(Command::GenerateKey) = args.command {
        let keypair = KeyPair::random();
        println!("private key: {}", keypair.private_key_hex());
        println!("address:     {}", keypair.address());
        return Ok(());
    }

    info!("Starting Apex Faucet Service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = FaucetConfig::load(args.config.as_deref())?;

    // Override with CLI arguments
    if let Some(addr) = args.server_addr {
        config.server_addr = addr;
    }

    if let Some(rpc_url) = args.rpc_url {
        config.rpc_url = rpc_url;
    }

    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }

    info!("Configuration:");
    info!("  Server address: {}", config.server_addr);
    info!("  RPC URL: {}", config.rpc_url);
    info!("  Grant amount: {} {}", config.grant_amount, config.token_symbol);
    info!("  Cooldown: {} ms", config.cooldown_ms);
    info!("  Ledger path: {}", config.db_path);

    metrics::register();

    // Open the eligibility ledger
    let ledger = Arc::new(EligibilityLedger::open(&config.db_path)?);
    let stats = ledger.stats()?;
    info!("Previous statistics:");
    info!("  Claimants: {}", stats.claimants);
    info!("  Units dispensed: {}", stats.total_granted);

    // Create the node client and the dispenser
    let node: Arc<dyn LedgerNode> =
        Arc::new(HttpNodeClient::new(config.rpc_url.clone(), config.rpc_timeout())?);
    let dispenser = Dispenser::new(&config, ledger.clone(), node.clone())?;
    info!("Dispenser initialized");

    let state = AppState {
        dispenser,
        ledger,
        node,
    };

    // Build router
    let mut app = axum::Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/health", axum::routing::get(health_handler))
        .route("/metrics", axum::routing::get(metrics_handler))
        .route("/api/status", axum::routing::get(status_handler))
        .route("/api/claim", axum::routing::post(claim_handler))
        .with_state(state);

    // Add CORS if enabled
    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        app = app.layer(cors);
        info!("CORS enabled");
    }

    // Start server
    let addr: SocketAddr = config
        .server_addr
        .parse()
        .with_context(|| format!("invalid server address: {}", config.server_addr))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down gracefully");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
