//! REST API for the health check service
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Cluster** handle for reaching account actors
//! - **Existence lookup** in front of every account route: unknown or
//!   malformed account ids are answered with 404 before any actor is touched
//!
//! ## Endpoints
//!
//! - `GET    /api/v1/health` - Service and storage health
//! - `POST   /api/v1/accounts` - Provision an account
//! - `GET    /api/v1/accounts/:account_id` - Account snapshot
//! - `POST   /api/v1/accounts/:account_id/healthchecks` - Create a health check
//! - `GET    /api/v1/accounts/:account_id/healthchecks/:healthcheck_id` - Config and history
//! - `PUT    /api/v1/accounts/:account_id/healthchecks/:healthcheck_id` - Update a health check
//! - `DELETE /api/v1/accounts/:account_id/healthchecks/:healthcheck_id` - Delete a health check

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{HealthResponse, IdResponse};

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Enable permissive CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ApiConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr,
            enable_cors: config.enable_cors,
        }
    }
}

/// Build the router with every route
pub fn build_router(config: &ApiConfig, state: ApiState) -> Router {
    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/accounts", post(routes::accounts::create_account))
        .route(
            "/api/v1/accounts/:account_id",
            get(routes::accounts::get_account),
        )
        .route(
            "/api/v1/accounts/:account_id/healthchecks",
            post(routes::healthchecks::create_healthcheck),
        )
        .route(
            "/api/v1/accounts/:account_id/healthchecks/:healthcheck_id",
            get(routes::healthchecks::get_healthcheck)
                .put(routes::healthchecks::update_healthcheck)
                .delete(routes::healthchecks::delete_healthcheck),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = build_router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
