//! Error types for the actor runtime

use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by the actor runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A string could not be parsed as an actor id
    #[error("invalid actor id: {0:?}")]
    InvalidId(String),

    /// The instance failed its load-before-serve barrier
    #[error("{kind} actor {id} failed to activate: {reason}")]
    ActivationFailed {
        kind: &'static str,
        id: String,
        reason: String,
    },

    /// The instance went away before it answered
    #[error("{kind} actor {id} dropped the request without replying")]
    NoReply { kind: &'static str, id: String },

    /// Delivery kept racing with instance passivation
    #[error("{kind} actor {id} mailbox unavailable")]
    MailboxClosed { kind: &'static str, id: String },

    /// The receiving mailbox is full (only reported by non-blocking sends)
    #[error("{kind} actor {id} mailbox is full")]
    MailboxFull { kind: &'static str, id: String },

    /// The scheduler task is gone
    #[error("scheduler stopped")]
    SchedulerStopped,

    /// The runtime has been shut down
    #[error("actor runtime stopped")]
    Stopped,

    /// Reading or writing actor state failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}
