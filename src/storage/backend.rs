//! Storage backend trait definition
//!
//! This module defines the core `StorageBackend` trait that all
//! storage implementations must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::error::StorageResult;
use super::schema::AlarmRow;

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Trait for persistent storage backends
///
/// Every actor owns a private partition identified by `(kind, id)`. The
/// runtime only ever touches a partition from the task that currently hosts
/// the actor, so implementations do not need cross-partition transactions.
///
/// ## Durability
///
/// A write must be durable once its future resolves. Actors await every write
/// before replying to the caller that triggered it.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared by every actor
/// task through an `Arc<dyn StorageBackend>`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read a single value from an actor partition
    async fn get_value(&self, kind: &str, id: &str, key: &str) -> StorageResult<Option<Value>>;

    /// Write (insert or replace) a single value in an actor partition
    async fn put_value(&self, kind: &str, id: &str, key: &str, value: Value) -> StorageResult<()>;

    /// Delete every value in an actor partition
    ///
    /// The partition's alarm is not touched. Returns the number of deleted keys.
    async fn delete_all(&self, kind: &str, id: &str) -> StorageResult<usize>;

    /// Read the pending alarm of an actor
    async fn get_alarm(&self, kind: &str, id: &str) -> StorageResult<Option<DateTime<Utc>>>;

    /// Persist the pending alarm of an actor, replacing any previous one
    async fn set_alarm(&self, kind: &str, id: &str, fire_at: DateTime<Utc>) -> StorageResult<()>;

    /// Remove the pending alarm of an actor (no-op if none)
    async fn delete_alarm(&self, kind: &str, id: &str) -> StorageResult<()>;

    /// List all pending alarms for an actor kind, earliest first
    ///
    /// Used on start-up to re-arm timers that outlived the previous process.
    async fn list_alarms(&self, kind: &str) -> StorageResult<Vec<AlarmRow>>;

    /// Write an entry in a lookup namespace
    async fn put_lookup(&self, namespace: &str, key: &str, value: Value) -> StorageResult<()>;

    /// Read an entry from a lookup namespace
    async fn get_lookup(&self, namespace: &str, key: &str) -> StorageResult<Option<Value>>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database, check file access).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Get backend-specific statistics
    ///
    /// Returns human-readable stats about the backend
    /// (e.g., "SQLite: 120 values, 4 alarms, 0.05 MB on disk").
    async fn get_stats(&self) -> StorageResult<String>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
