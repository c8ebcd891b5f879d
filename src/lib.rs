pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod cluster;
pub mod config;
pub mod history;
pub mod probe;
pub mod runtime;
pub mod storage;
pub mod util;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::actors::MonitorError;
use crate::history::HistoryBuffer;
use crate::probe::ProbeOutcome;
use crate::runtime::ActorId;

/// Configuration of one health check, owned by its healthcheck actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcheckConfig {
    /// Owning account, fixed at creation
    pub account_id: ActorId,
    pub url: String,
    pub enabled: bool,
    #[serde(alias = "period")]
    pub period_seconds: u32,
}

/// Health check configuration as submitted by a client
///
/// Any `accountId` in the request is ignored; the owning account stamps its
/// own id when turning the request into a [`HealthcheckConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcheckRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub url: String,
    pub enabled: bool,
    #[serde(alias = "period")]
    pub period_seconds: u32,
}

impl HealthcheckRequest {
    pub fn new(url: impl Into<String>, enabled: bool, period_seconds: u32) -> Self {
        Self {
            account_id: None,
            url: url.into(),
            enabled,
            period_seconds,
        }
    }

    /// Reject a zero period and anything that is not an absolute http(s) URL
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.period_seconds == 0 {
            return Err(MonitorError::InvalidConfig(
                "periodSeconds must be greater than zero".to_string(),
            ));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| MonitorError::InvalidConfig(format!("invalid url {:?}: {e}", self.url)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(MonitorError::InvalidConfig(format!(
                "unsupported url scheme {scheme:?}"
            ))),
        }
    }

    /// Build the stored config owned by `account_id`
    pub fn into_config(self, account_id: ActorId) -> HealthcheckConfig {
        HealthcheckConfig {
            account_id,
            url: self.url,
            enabled: self.enabled,
            period_seconds: self.period_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Unhealthy,
}

/// Outcome of one probe of one health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcheckResult {
    pub id: ActorId,
    pub account_id: ActorId,
    pub health: Health,
    pub reason: String,
    pub code: u16,

    /// -1 if the probe never completed
    pub latency_ms: i64,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl HealthcheckResult {
    pub fn from_outcome(
        id: ActorId,
        account_id: ActorId,
        outcome: ProbeOutcome,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            health: outcome.health,
            reason: outcome.reason,
            code: outcome.code,
            latency_ms: outcome.latency_ms,
            timestamp,
        }
    }
}

/// Config and recent history of one health check
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthcheckDetails {
    /// `None` until the first config write
    #[serde(flatten)]
    pub config: Option<HealthcheckConfig>,
    pub history: HistoryBuffer<HealthcheckResult>,
}

/// Registry and mirrored latest results of one account
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub healthchecks: BTreeMap<ActorId, HealthcheckConfig>,
    pub updates: BTreeMap<ActorId, HealthcheckResult>,
}
