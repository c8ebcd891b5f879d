//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! ## Limitations
//!
//! - **Replication**: No built-in replication (file-level backups only)
//! - **Distributed**: Single-machine only

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{AlarmRow, millis_to_timestamp, timestamp_to_millis};

/// SQLite storage backend
///
/// Stores actor partitions, alarms and lookup entries in a local SQLite file.
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create tables
    /// 3. Configure SQLite for WAL mode with normal synchronous writes
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use edge_healthchecks::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./healthchecks.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn decode(raw: &str) -> StorageResult<Value> {
        serde_json::from_str(raw).map_err(|e| {
            StorageError::SerializationError(format!("failed to deserialize value: {}", e))
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self))]
    async fn get_value(&self, kind: &str, id: &str, key: &str) -> StorageResult<Option<Value>> {
        let row = sqlx::query(
            "SELECT value FROM actor_state WHERE kind = ? AND actor_id = ? AND key = ?",
        )
        .bind(kind)
        .bind(id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::decode(row.get::<&str, _>("value")))
            .transpose()
    }

    #[instrument(skip(self, value))]
    async fn put_value(&self, kind: &str, id: &str, key: &str, value: Value) -> StorageResult<()> {
        let encoded = serde_json::to_string(&value)?;

        sqlx::query(
            r#"
            INSERT INTO actor_state (kind, actor_id, key, value, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (kind, actor_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(kind)
        .bind(id)
        .bind(key)
        .bind(encoded)
        .bind(timestamp_to_millis(&Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, kind: &str, id: &str) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM actor_state WHERE kind = ? AND actor_id = ?")
            .bind(kind)
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() as usize;
        debug!("deleted {} values for {}/{}", deleted, kind, id);
        Ok(deleted)
    }

    async fn get_alarm(&self, kind: &str, id: &str) -> StorageResult<Option<DateTime<Utc>>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT fire_at FROM actor_alarms WHERE kind = ? AND actor_id = ?")
                .bind(kind)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(millis,)| millis_to_timestamp(millis)))
    }

    #[instrument(skip(self), fields(fire_at = %fire_at))]
    async fn set_alarm(&self, kind: &str, id: &str, fire_at: DateTime<Utc>) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO actor_alarms (kind, actor_id, fire_at)
            VALUES (?, ?, ?)
            ON CONFLICT (kind, actor_id) DO UPDATE SET fire_at = excluded.fire_at
            "#,
        )
        .bind(kind)
        .bind(id)
        .bind(timestamp_to_millis(&fire_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_alarm(&self, kind: &str, id: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM actor_alarms WHERE kind = ? AND actor_id = ?")
            .bind(kind)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_alarms(&self, kind: &str) -> StorageResult<Vec<AlarmRow>> {
        let rows = sqlx::query(
            "SELECT kind, actor_id, fire_at FROM actor_alarms WHERE kind = ? ORDER BY fire_at ASC",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        let alarms: Vec<AlarmRow> = rows
            .into_iter()
            .map(|row| AlarmRow {
                kind: row.get("kind"),
                actor_id: row.get("actor_id"),
                fire_at: millis_to_timestamp(row.get("fire_at")),
            })
            .collect();

        debug!("found {} pending alarms for kind {}", alarms.len(), kind);
        Ok(alarms)
    }

    async fn put_lookup(&self, namespace: &str, key: &str, value: Value) -> StorageResult<()> {
        let encoded = serde_json::to_string(&value)?;

        sqlx::query(
            r#"
            INSERT INTO lookup (namespace, key, value)
            VALUES (?, ?, ?)
            ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(namespace)
        .bind(key)
        .bind(encoded)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_lookup(&self, namespace: &str, key: &str) -> StorageResult<Option<Value>> {
        let row = sqlx::query("SELECT value FROM lookup WHERE namespace = ? AND key = ?")
            .bind(namespace)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::decode(row.get::<&str, _>("value")))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        // Simple ping query to verify connection
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> StorageResult<String> {
        let (values,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM actor_state")
            .fetch_one(&self.pool)
            .await?;

        let (partitions,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM (SELECT DISTINCT kind, actor_id FROM actor_state)",
        )
        .fetch_one(&self.pool)
        .await?;

        let (alarms,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM actor_alarms")
            .fetch_one(&self.pool)
            .await?;

        let file_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        let file_size_mb = file_size as f64 / 1_000_000.0;

        Ok(format!(
            "SQLite: {} values across {} partitions, {} alarms, {:.2} MB on disk",
            values, partitions, alarms, file_size_mb
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
