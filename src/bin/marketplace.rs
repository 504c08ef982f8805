use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

use homeserve_backend::config::Config;
use homeserve_backend::routes::marketplace_router;
use homeserve_backend::state::MarketplaceState;
use homeserve_backend::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let (config, loaded_from) = Config::discover()?;
    match loaded_from {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("No configuration file found, using defaults"),
    }

    let app = marketplace_router(MarketplaceState::new(&config)?);

    let addr: SocketAddr = format!("{}:{}", config.system.host, config.system.marketplace_port).parse()?;
    info!("Starting marketplace service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
