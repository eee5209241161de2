//! songlab-relay - Credential Relay Service
//!
//! Runs the generation engine server-side so the provider credential never
//! reaches client devices. Exposes the single `POST /generate` entrypoint
//! plus `GET /health`.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use songlab_common::config::{self, TomlConfig};
use songlab_engine::ReplicateApi;
use songlab_relay::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting songlab-relay (Credential Relay) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let toml_config = TomlConfig::load_default()?;

    // Credential resolution is fatal on failure; the relay is pointless
    // without the provider credential.
    let token = config::resolve_api_token(&toml_config)?;
    let port = config::resolve_relay_port(&toml_config)?;

    let provider = Arc::new(ReplicateApi::new(token)?);
    let state = AppState::new(provider);
    let app = songlab_relay::build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on http://0.0.0.0:{port}");
    info!("Health check: http://127.0.0.1:{port}/health");

    axum::serve(listener, app).await?;

    Ok(())
}
