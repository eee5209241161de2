//! songlab-relay library interface
//!
//! The credential relay: runs the same generation engine as a client
//! process would, but on infrastructure that alone holds the provider
//! credential. Clients reach it through one request/response entrypoint
//! (`POST /generate`), so the credential never ships to a device.

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use songlab_engine::{GenerationOrchestrator, ProviderApi};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The shared generation engine, configured with the server-side credential
    pub orchestrator: Arc<GenerationOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State backed by the given provider transport with the contractual
    /// polling parameters.
    pub fn new(provider: Arc<dyn ProviderApi>) -> Self {
        Self::with_orchestrator(GenerationOrchestrator::new(provider))
    }

    pub fn with_orchestrator(orchestrator: GenerationOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::generate_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
