//! API response types
//!
//! Account snapshots and health check details are served as the domain types
//! themselves; only the envelopes below are API specific.

use serde::{Deserialize, Serialize};

use crate::runtime::ActorId;

/// Body of every create/update/delete response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: ActorId,
}

/// Storage part of the health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageHealth {
    pub healthy: bool,
    pub message: String,
    pub stats: Option<String>,
}

/// Response of `GET /api/v1/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: StorageHealth,
    pub live_accounts: usize,
    pub live_healthchecks: usize,
}
