//! The durable actor contract
//!
//! An [`Actor`] is bound to one [`ActorId`] and one private storage partition.
//! The runtime guarantees that:
//!
//! 1. [`Actor::load`] completes before any message or alarm is handled
//! 2. messages and alarms for one id are handled strictly one at a time
//! 3. at most one instance per id is live at a time
//!
//! Actors only touch their state through the [`ActorContext`] they are handed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use super::error::RuntimeError;
use super::id::ActorId;
use super::scheduler::SchedulerHandle;
use crate::storage::schema::truncate_to_millis;
use crate::storage::{StorageBackend, StorageResult};

/// An independently addressable entity with private durable state
#[async_trait]
pub trait Actor: Sized + Send + 'static {
    /// Kind name, used as the storage partition prefix
    const KIND: &'static str;

    /// Messages handled by this actor
    type Message: Send + 'static;

    /// Shared environment the actor reaches its peers through
    type Env: Send + Sync + 'static;

    /// Build the instance from persisted state (load-before-serve barrier)
    async fn load(ctx: &ActorContext<Self>) -> Result<Self, RuntimeError>;

    /// Handle one message
    async fn handle(&mut self, ctx: &ActorContext<Self>, msg: Self::Message);

    /// Handle one alarm firing
    async fn alarm(&mut self, _ctx: &ActorContext<Self>) {}
}

/// Private storage of one actor instance
#[derive(Clone)]
pub struct ActorStorage {
    backend: Arc<dyn StorageBackend>,
    kind: &'static str,
    id: ActorId,
}

impl ActorStorage {
    pub(crate) fn new(backend: Arc<dyn StorageBackend>, kind: &'static str, id: ActorId) -> Self {
        Self { backend, kind, id }
    }

    /// Read and deserialize a value; `None` if the key was never written
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let value = self
            .backend
            .get_value(self.kind, self.id.as_str(), key)
            .await?;

        Ok(value.map(serde_json::from_value).transpose()?)
    }

    /// Serialize and durably write a value
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let value = serde_json::to_value(value)?;
        self.backend
            .put_value(self.kind, self.id.as_str(), key, value)
            .await
    }

    /// Delete every key of this partition
    pub async fn delete_all(&self) -> StorageResult<usize> {
        self.backend.delete_all(self.kind, self.id.as_str()).await
    }

    /// The pending alarm, if any
    pub async fn get_alarm(&self) -> StorageResult<Option<DateTime<Utc>>> {
        self.backend.get_alarm(self.kind, self.id.as_str()).await
    }

    pub(crate) async fn set_alarm(&self, fire_at: DateTime<Utc>) -> StorageResult<()> {
        self.backend
            .set_alarm(self.kind, self.id.as_str(), fire_at)
            .await
    }

    pub(crate) async fn delete_alarm(&self) -> StorageResult<()> {
        self.backend.delete_alarm(self.kind, self.id.as_str()).await
    }
}

/// Everything an actor instance may touch while handling a message
pub struct ActorContext<A: Actor> {
    id: ActorId,
    storage: ActorStorage,
    scheduler: SchedulerHandle,
    env: Arc<A::Env>,
}

impl<A: Actor> ActorContext<A> {
    pub(crate) fn new(
        id: ActorId,
        backend: Arc<dyn StorageBackend>,
        scheduler: SchedulerHandle,
        env: Arc<A::Env>,
    ) -> Self {
        Self {
            storage: ActorStorage::new(backend, A::KIND, id.clone()),
            id,
            scheduler,
            env,
        }
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn storage(&self) -> &ActorStorage {
        &self.storage
    }

    pub fn env(&self) -> &A::Env {
        &self.env
    }

    /// Arm the one-shot alarm, replacing any pending one
    ///
    /// The alarm is persisted before it is handed to the scheduler, so it
    /// survives a restart. Returns the (millisecond-truncated) fire time.
    pub async fn set_alarm(&self, fire_at: DateTime<Utc>) -> Result<DateTime<Utc>, RuntimeError> {
        let fire_at = truncate_to_millis(fire_at);
        self.storage.set_alarm(fire_at).await?;
        self.scheduler.arm(self.id.clone(), fire_at).await?;
        trace!("{} {} alarm set for {}", A::KIND, self.id, fire_at);
        Ok(fire_at)
    }

    /// Cancel the pending alarm, if any
    pub async fn delete_alarm(&self) -> Result<(), RuntimeError> {
        self.storage.delete_alarm().await?;
        self.scheduler.disarm(self.id.clone()).await?;
        trace!("{} {} alarm deleted", A::KIND, self.id);
        Ok(())
    }

    /// The pending alarm, if any
    pub async fn get_alarm(&self) -> Result<Option<DateTime<Utc>>, RuntimeError> {
        Ok(self.storage.get_alarm().await?)
    }
}
