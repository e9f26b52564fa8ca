// MoltyMarket Prediction Ledger - Main Entry Point

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use moltymarket_ledger::routes::ENDPOINTS;
use moltymarket_ledger::{build_router, AppConfig, AppState, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("🎯 MoltyMarket Prediction Ledger starting");

    let config = AppConfig::from_env()?;
    let state: SharedState = Arc::new(AppState::from_config(&config)?);
    let shutdown_state = state.clone();

    let app = build_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server running on http://{}", addr);
    for (method, path, about) in ENDPOINTS {
        info!("   {:<5} {:<30} - {}", method, path, about);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install CTRL+C handler: {}", e);
            }
            info!("🛑 Shutdown signal received...");
        })
        .await?;

    shutdown_state.shutdown();
    info!("👋 Goodbye!");
    Ok(())
}
