//! In-memory storage backend (no persistence)
//!
//! This backend keeps actor state in process memory.
//! It's useful for:
//! - Testing without database dependencies
//! - Ephemeral deployments where losing state on restart is acceptable
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart
//! - **Single process**: State is not shared between processes

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::backend::{HealthStatus, StorageBackend};
use super::error::StorageResult;
use super::schema::{AlarmRow, truncate_to_millis};

type PartitionKey = (String, String);

/// In-memory storage backend
#[derive(Default)]
pub struct MemoryBackend {
    /// Actor values grouped by (kind, id)
    values: RwLock<HashMap<PartitionKey, BTreeMap<String, Value>>>,

    /// Pending alarms by (kind, id)
    alarms: RwLock<HashMap<PartitionKey, DateTime<Utc>>>,

    /// Lookup entries by (namespace, key)
    lookup: RwLock<HashMap<PartitionKey, Value>>,
}

impl MemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &str, b: &str) -> PartitionKey {
        (a.to_string(), b.to_string())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get_value(&self, kind: &str, id: &str, key: &str) -> StorageResult<Option<Value>> {
        let values = self.values.read().await;
        Ok(values
            .get(&Self::key(kind, id))
            .and_then(|partition| partition.get(key))
            .cloned())
    }

    async fn put_value(&self, kind: &str, id: &str, key: &str, value: Value) -> StorageResult<()> {
        trace!("in-memory backend: put {kind}/{id}/{key}");
        self.values
            .write()
            .await
            .entry(Self::key(kind, id))
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_all(&self, kind: &str, id: &str) -> StorageResult<usize> {
        let removed = self
            .values
            .write()
            .await
            .remove(&Self::key(kind, id))
            .map(|partition| partition.len())
            .unwrap_or(0);
        debug!("in-memory backend: deleted {removed} values for {kind}/{id}");
        Ok(removed)
    }

    async fn get_alarm(&self, kind: &str, id: &str) -> StorageResult<Option<DateTime<Utc>>> {
        Ok(self.alarms.read().await.get(&Self::key(kind, id)).copied())
    }

    async fn set_alarm(&self, kind: &str, id: &str, fire_at: DateTime<Utc>) -> StorageResult<()> {
        self.alarms
            .write()
            .await
            .insert(Self::key(kind, id), truncate_to_millis(fire_at));
        Ok(())
    }

    async fn delete_alarm(&self, kind: &str, id: &str) -> StorageResult<()> {
        self.alarms.write().await.remove(&Self::key(kind, id));
        Ok(())
    }

    async fn list_alarms(&self, kind: &str) -> StorageResult<Vec<AlarmRow>> {
        let alarms = self.alarms.read().await;
        let mut rows: Vec<AlarmRow> = alarms
            .iter()
            .filter(|((k, _), _)| k == kind)
            .map(|((k, id), fire_at)| AlarmRow {
                kind: k.clone(),
                actor_id: id.clone(),
                fire_at: *fire_at,
            })
            .collect();
        rows.sort_by_key(|row| row.fire_at);
        Ok(rows)
    }

    async fn put_lookup(&self, namespace: &str, key: &str, value: Value) -> StorageResult<()> {
        self.lookup
            .write()
            .await
            .insert(Self::key(namespace, key), value);
        Ok(())
    }

    async fn get_lookup(&self, namespace: &str, key: &str) -> StorageResult<Option<Value>> {
        Ok(self
            .lookup
            .read()
            .await
            .get(&Self::key(namespace, key))
            .cloned())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let partitions = self.values.read().await.len();
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("partitions".to_string(), partitions.to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let values = self.values.read().await;
        let total_values: usize = values.values().map(BTreeMap::len).sum();
        Ok(format!(
            "In-Memory: {} values across {} partitions, {} alarms",
            total_values,
            values.len(),
            self.alarms.read().await.len()
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
