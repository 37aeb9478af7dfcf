//! # bff-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the holder aggregation gateway.
//! Binds to configurable port (default 8080).

use std::sync::Arc;

use bff_api::state::{AppConfig, AppState};
use bff_client::{DownstreamClients, DownstreamConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Build configuration from environment.
    let config = AppConfig::from_env()?;
    let codec = bff_api::state::codec_from_env().map_err(|e| {
        tracing::error!("Identifier codec initialization failed: {e}");
        e
    })?;

    let downstream = DownstreamConfig::from_env()?;
    tracing::info!(?downstream, "downstream services configured");
    let (holders, holdings) = DownstreamClients::new(downstream)
        .map_err(|e| {
            tracing::error!("Failed to create downstream clients: {e}");
            e
        })?
        .into_parts();

    if config.expose_encoder {
        tracing::warn!("identifier encoder route is enabled; do not expose it publicly");
    }

    let port = config.port;
    let state = AppState::new(config, codec, Arc::new(holders), Arc::new(holdings));
    let app = bff_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("BFF gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize structured tracing. `BFF_LOG_FORMAT=json` selects JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("BFF_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
