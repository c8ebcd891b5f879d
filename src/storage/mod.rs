//! Storage backends for durable actor state
//!
//! This module provides a trait-based abstraction for persisting actor
//! partitions, their pending alarms and the account lookup table.
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` trait allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio actors
//! - **Partitioned**: Every actor reads and writes only its own `(kind, id)` partition
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database, state survives restarts
//! - **In-Memory** (fallback): No persistence, for testing or ephemeral runs
//!
//! ## Usage
//!
//! ```no_run
//! use edge_healthchecks::storage::{StorageBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./healthchecks.db").await?;
//!     println!("{}", backend.get_stats().await?);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::config::StorageConfig;

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use schema::AlarmRow;

/// Open the backend selected by the storage configuration
pub async fn open_backend(config: &StorageConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    match config {
        StorageConfig::None => {
            info!("using in-memory storage (state is lost on restart)");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => Ok(Arc::new(sqlite::SqliteBackend::new(path).await?)),
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => Err(StorageError::InvalidConfig(
            "sqlite backend requested but the `storage-sqlite` feature is disabled".to_string(),
        )),
    }
}
