//! Row types shared by the storage backends
//!
//! ## Layout
//!
//! Actor state is partitioned by `(kind, actor_id)`. Inside a partition every
//! value lives under a string key and is stored as a JSON document, so actors
//! can evolve their state structs without schema migrations:
//!
//! ```text
//! actor_state   (kind, actor_id, key)  -> value JSON
//! actor_alarms  (kind, actor_id)       -> fire_at (unix millis)
//! lookup        (namespace, key)       -> value JSON
//! ```
//!
//! The `lookup` table is not owned by any actor. The front door uses it to
//! check that an account id was provisioned before routing to the actor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lookup namespace holding one marker per provisioned account
pub const ACCOUNTS_NAMESPACE: &str = "accounts";

/// A persisted one-shot alarm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRow {
    /// Actor kind (e.g. "healthcheck")
    pub kind: String,

    /// Actor id within the kind
    pub actor_id: String,

    /// When the alarm should fire (millisecond precision)
    pub fire_at: DateTime<Utc>,
}

/// Convert a timestamp to unix milliseconds for storage
pub fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Convert unix milliseconds from storage back to a timestamp
pub fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Truncate a timestamp to the millisecond precision the backends persist
///
/// Alarms are compared for equality after a round trip through storage, so
/// every timestamp handed to a backend goes through this first.
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    millis_to_timestamp(timestamp_to_millis(&dt))
}
