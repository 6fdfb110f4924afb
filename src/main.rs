use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use saferoute::config::{AppConfig, Args};
use saferoute::hotspots::HotspotStore;
use saferoute::routing::RoutingClient;
use saferoute::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_args(&args).context("failed to load configuration")?;

    // 1. Load day/night hotspot datasets (a missing file just means no risk data)
    let hotspots = HotspotStore::load(
        config.hotspots.day.as_deref(),
        config.hotspots.night.as_deref(),
    )
    .context("failed to load hotspot datasets")?;

    // 2. Routing service client
    let routing = RoutingClient::new(&config.routing).context("failed to build routing client")?;
    info!(
        base_url = %config.routing.base_url,
        profile = %config.routing.profile,
        "routing via OSRM"
    );

    let state = Arc::new(AppState {
        hotspots,
        routing,
        geometry: config.geometry,
    });

    // 3. Serve
    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %config.bind, geometry = ?config.geometry, "API server running");
    axum::serve(listener, app).await?;

    Ok(())
}
