//! Health check endpoints
//!
//! A malformed health check id can never be registered, so it is answered
//! like an unknown one.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::IdResponse,
};
use crate::runtime::ActorId;
use crate::{HealthcheckDetails, HealthcheckRequest};

fn parse_healthcheck_id(raw: &str) -> ApiResult<ActorId> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("health check {raw} not found")))
}

/// POST /api/v1/accounts/:account_id/healthchecks
pub async fn create_healthcheck(
    State(state): State<ApiState>,
    Path(account_id): Path<String>,
    payload: Result<Json<HealthcheckRequest>, JsonRejection>,
) -> ApiResult<Json<IdResponse>> {
    let account = state.account(&account_id).await?;
    let Json(request) = payload?;

    let id = account.create_healthcheck(request).await?;
    Ok(Json(IdResponse { id }))
}

/// GET /api/v1/accounts/:account_id/healthchecks/:healthcheck_id
pub async fn get_healthcheck(
    State(state): State<ApiState>,
    Path((account_id, healthcheck_id)): Path<(String, String)>,
) -> ApiResult<Json<HealthcheckDetails>> {
    let account = state.account(&account_id).await?;
    let id = parse_healthcheck_id(&healthcheck_id)?;

    Ok(Json(account.get_healthcheck(id).await?))
}

/// PUT /api/v1/accounts/:account_id/healthchecks/:healthcheck_id
pub async fn update_healthcheck(
    State(state): State<ApiState>,
    Path((account_id, healthcheck_id)): Path<(String, String)>,
    payload: Result<Json<HealthcheckRequest>, JsonRejection>,
) -> ApiResult<Json<IdResponse>> {
    let account = state.account(&account_id).await?;
    let id = parse_healthcheck_id(&healthcheck_id)?;
    let Json(request) = payload?;

    let id = account.update_healthcheck(id, request).await?;
    Ok(Json(IdResponse { id }))
}

/// DELETE /api/v1/accounts/:account_id/healthchecks/:healthcheck_id
pub async fn delete_healthcheck(
    State(state): State<ApiState>,
    Path((account_id, healthcheck_id)): Path<(String, String)>,
) -> ApiResult<Json<IdResponse>> {
    let account = state.account(&account_id).await?;
    let id = parse_healthcheck_id(&healthcheck_id)?;

    let id = account.delete_healthcheck(id).await?;
    Ok(Json(IdResponse { id }))
}
