//! API shared state

use std::sync::Arc;

use crate::actors::AccountActor;
use crate::cluster::Cluster;
use crate::runtime::ActorHandle;

use super::error::{ApiError, ApiResult};

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub cluster: Arc<Cluster>,
}

impl ApiState {
    pub fn new(cluster: Arc<Cluster>) -> Self {
        Self { cluster }
    }

    /// Front door for account routes: only provisioned accounts get a handle
    pub async fn account(&self, raw_id: &str) -> ApiResult<ActorHandle<AccountActor>> {
        match self.cluster.account_exists(raw_id).await? {
            Some(id) => Ok(self.cluster.account(id)),
            None => Err(ApiError::NotFound(format!("account {raw_id} not found"))),
        }
    }
}
