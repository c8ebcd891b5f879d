//! Account endpoints

use axum::{
    Json,
    extract::{Path, State},
};

use crate::AccountSnapshot;
use crate::api::{error::ApiResult, state::ApiState, types::IdResponse};

/// POST /api/v1/accounts
///
/// Provision a new account
pub async fn create_account(State(state): State<ApiState>) -> ApiResult<Json<IdResponse>> {
    let id = state.cluster.create_account().await?;
    Ok(Json(IdResponse { id }))
}

/// GET /api/v1/accounts/:account_id
///
/// Registered health checks and the latest mirrored result of each
pub async fn get_account(
    State(state): State<ApiState>,
    Path(account_id): Path<String>,
) -> ApiResult<Json<AccountSnapshot>> {
    let account = state.account(&account_id).await?;
    Ok(Json(account.snapshot().await?))
}
