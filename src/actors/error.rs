//! Errors of the monitoring protocol

use thiserror::Error;

use crate::runtime::RuntimeError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Unknown account or unregistered health check
    #[error("{0} not found")]
    NotFound(String),

    /// Rejected health check configuration
    #[error("invalid health check config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
