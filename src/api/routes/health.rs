//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{
    state::ApiState,
    types::{HealthResponse, StorageHealth},
};

/// GET /api/v1/health
///
/// Service liveness plus storage backend health. Always 200; a failing
/// backend is reported as `"degraded"`.
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let backend = state.cluster.backend();

    let storage = match backend.health_check().await {
        Ok(health) => StorageHealth {
            healthy: health.healthy,
            message: health.message,
            stats: backend.get_stats().await.ok(),
        },
        Err(e) => StorageHealth {
            healthy: false,
            message: e.to_string(),
            stats: None,
        },
    };

    let (live_accounts, live_healthchecks) = state.cluster.live_instances();

    Json(HealthResponse {
        status: if storage.healthy { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage,
        live_accounts,
        live_healthchecks,
    })
}
