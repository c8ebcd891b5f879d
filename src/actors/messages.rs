//! Message types for actor communication
//!
//! Every request that expects an answer carries a oneshot `respond_to`
//! channel. The only fire-and-forget message is
//! [`AccountCommand::ReportResult`], which health checks send without waiting
//! so they never block on their account.

use tokio::sync::oneshot;

use super::error::MonitorError;
use crate::runtime::ActorId;
use crate::{
    AccountSnapshot, HealthcheckConfig, HealthcheckDetails, HealthcheckRequest, HealthcheckResult,
};

/// Commands handled by a HealthcheckActor
#[derive(Debug)]
pub enum HealthcheckCommand {
    /// Write the config and arm or disarm the probe timer
    Configure {
        config: HealthcheckConfig,
        respond_to: oneshot::Sender<Result<ActorId, MonitorError>>,
    },

    /// Read the config and full history
    Get {
        respond_to: oneshot::Sender<HealthcheckDetails>,
    },

    /// Wipe all state and disarm the timer (idempotent)
    Delete {
        respond_to: oneshot::Sender<Result<ActorId, MonitorError>>,
    },

    /// Run one probe cycle now without touching the timer
    CheckNow {
        respond_to: oneshot::Sender<Result<HealthcheckResult, MonitorError>>,
    },
}

/// Commands handled by an AccountActor
#[derive(Debug)]
pub enum AccountCommand {
    CreateHealthcheck {
        request: HealthcheckRequest,
        respond_to: oneshot::Sender<Result<ActorId, MonitorError>>,
    },

    UpdateHealthcheck {
        id: ActorId,
        request: HealthcheckRequest,
        respond_to: oneshot::Sender<Result<ActorId, MonitorError>>,
    },

    GetHealthcheck {
        id: ActorId,
        respond_to: oneshot::Sender<Result<HealthcheckDetails, MonitorError>>,
    },

    DeleteHealthcheck {
        id: ActorId,
        respond_to: oneshot::Sender<Result<ActorId, MonitorError>>,
    },

    /// Latest probe result of one of this account's health checks
    ReportResult { result: HealthcheckResult },

    Snapshot {
        respond_to: oneshot::Sender<AccountSnapshot>,
    },
}
