//! Cluster - the running monitoring service
//!
//! Owns one namespace per actor kind, the shared probe client and the
//! storage backend. It is also the environment both actor kinds reach each
//! other through, so it is built with [`Arc::new_cyclic`] and handed to the
//! namespaces as a weak reference.

use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tracing::{info, warn};

use crate::actors::{AccountActor, HealthcheckActor, MonitorError};
use crate::config::Config;
use crate::probe::ProbeExecutor;
use crate::runtime::{ActorHandle, ActorId, Namespace, NamespaceSettings};
use crate::storage::StorageBackend;
use crate::storage::schema::ACCOUNTS_NAMESPACE;

pub struct Cluster {
    accounts: Namespace<AccountActor>,
    healthchecks: Namespace<HealthcheckActor>,
    probe: ProbeExecutor,
    backend: Arc<dyn StorageBackend>,
}

impl Cluster {
    /// Build the namespaces and re-arm every persisted alarm
    pub async fn start(config: &Config, backend: Arc<dyn StorageBackend>) -> anyhow::Result<Arc<Self>> {
        let probe = ProbeExecutor::new(&config.probe).context("failed to build probe client")?;
        let settings = NamespaceSettings::from(&config.runtime);

        let cluster = Arc::new_cyclic(|env| Cluster {
            accounts: Namespace::new(backend.clone(), env.clone(), settings.clone()),
            healthchecks: Namespace::new(backend.clone(), env.clone(), settings),
            probe,
            backend,
        });

        cluster
            .accounts
            .restore_alarms()
            .await
            .context("failed to restore account alarms")?;
        let restored = cluster
            .healthchecks
            .restore_alarms()
            .await
            .context("failed to restore health check alarms")?;

        info!("cluster started, {restored} health checks scheduled");
        Ok(cluster)
    }

    pub fn accounts(&self) -> &Namespace<AccountActor> {
        &self.accounts
    }

    pub fn healthchecks(&self) -> &Namespace<HealthcheckActor> {
        &self.healthchecks
    }

    pub fn account(&self, id: ActorId) -> ActorHandle<AccountActor> {
        self.accounts.get(id)
    }

    pub fn healthcheck(&self, id: ActorId) -> ActorHandle<HealthcheckActor> {
        self.healthchecks.get(id)
    }

    pub fn probe(&self) -> &ProbeExecutor {
        &self.probe
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Provision a new account and record it in the existence lookup
    pub async fn create_account(&self) -> Result<ActorId, MonitorError> {
        let id = ActorId::new_unique();
        self.backend
            .put_lookup(ACCOUNTS_NAMESPACE, id.as_str(), json!([]))
            .await?;

        info!("provisioned account {id}");
        Ok(id)
    }

    /// The parsed id if the account was provisioned; malformed ids are absent
    pub async fn account_exists(&self, raw: &str) -> Result<Option<ActorId>, MonitorError> {
        let Ok(id) = raw.parse::<ActorId>() else {
            return Ok(None);
        };

        let entry = self
            .backend
            .get_lookup(ACCOUNTS_NAMESPACE, id.as_str())
            .await?;
        Ok(entry.map(|_| id))
    }

    /// Number of live (accounts, health checks)
    pub fn live_instances(&self) -> (usize, usize) {
        (self.accounts.live_count(), self.healthchecks.live_count())
    }

    /// Stop all actors and schedulers, then close the backend
    pub async fn shutdown(&self) {
        futures::join!(self.accounts.shutdown(), self.healthchecks.shutdown());

        if let Err(e) = self.backend.close().await {
            warn!("failed to close storage backend: {e}");
        }
        info!("cluster stopped");
    }
}
