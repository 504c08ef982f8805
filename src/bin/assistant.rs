use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

use homeserve_backend::config::Config;
use homeserve_backend::routes::assistant_router;
use homeserve_backend::state::AssistantState;
use homeserve_backend::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let (config, loaded_from) = Config::discover()?;
    match loaded_from {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("No configuration file found, using defaults"),
    }

    let state = AssistantState::new(&config)?;
    info!("Uploads stored in {}", state.upload_dir.display());
    let app = assistant_router(state);

    let addr: SocketAddr = format!("{}:{}", config.system.host, config.system.port).parse()?;
    info!("Starting assistant service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
