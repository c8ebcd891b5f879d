//! AccountActor - registry of an account's health checks
//!
//! The account keeps a local mirror of every health check config it created
//! and the latest result each one reported. Create and update validate the
//! request, stamp the account id, write the mirror and then forward the
//! config to the health check. The local write is not rolled back if the
//! forward fails.
//!
//! ## Message Flow
//!
//! ```text
//! API → AccountActor ──Configure/Get/Delete (ask)──► HealthcheckActor
//!            ▲                                             │
//!            └──────────── ReportResult (tell) ────────────┘
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{debug, info, instrument, trace, warn};

use super::error::MonitorError;
use super::messages::AccountCommand;
use crate::cluster::Cluster;
use crate::runtime::{Actor, ActorContext, ActorHandle, ActorId, RuntimeError};
use crate::{
    AccountSnapshot, HealthcheckConfig, HealthcheckDetails, HealthcheckRequest, HealthcheckResult,
};

const HEALTHCHECKS_KEY: &str = "healthchecks";
const UPDATES_KEY: &str = "updates";

pub struct AccountActor {
    healthchecks: BTreeMap<ActorId, HealthcheckConfig>,
    updates: BTreeMap<ActorId, HealthcheckResult>,
}

#[async_trait]
impl Actor for AccountActor {
    const KIND: &'static str = "account";
    type Message = AccountCommand;
    type Env = Cluster;

    async fn load(ctx: &ActorContext<Self>) -> Result<Self, RuntimeError> {
        let storage = ctx.storage();
        Ok(Self {
            healthchecks: storage.get(HEALTHCHECKS_KEY).await?.unwrap_or_default(),
            updates: storage.get(UPDATES_KEY).await?.unwrap_or_default(),
        })
    }

    async fn handle(&mut self, ctx: &ActorContext<Self>, msg: AccountCommand) {
        match msg {
            AccountCommand::CreateHealthcheck {
                request,
                respond_to,
            } => {
                let _ = respond_to.send(self.create_healthcheck(ctx, request).await);
            }
            AccountCommand::UpdateHealthcheck {
                id,
                request,
                respond_to,
            } => {
                let _ = respond_to.send(self.update_healthcheck(ctx, id, request).await);
            }
            AccountCommand::GetHealthcheck { id, respond_to } => {
                let _ = respond_to.send(self.get_healthcheck(ctx, &id).await);
            }
            AccountCommand::DeleteHealthcheck { id, respond_to } => {
                let _ = respond_to.send(self.delete_healthcheck(ctx, id).await);
            }
            AccountCommand::ReportResult { result } => {
                if let Err(e) = self.report_result(ctx, result).await {
                    warn!("failed to store reported result: {e}");
                }
            }
            AccountCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(AccountSnapshot {
                    healthchecks: self.healthchecks.clone(),
                    updates: self.updates.clone(),
                });
            }
        }
    }
}

impl AccountActor {
    fn ensure_registered(&self, id: &ActorId) -> Result<(), MonitorError> {
        if self.healthchecks.contains_key(id) {
            Ok(())
        } else {
            Err(MonitorError::NotFound(format!("health check {id}")))
        }
    }

    async fn persist_healthchecks(&self, ctx: &ActorContext<Self>) -> Result<(), MonitorError> {
        Ok(ctx
            .storage()
            .put(HEALTHCHECKS_KEY, &self.healthchecks)
            .await?)
    }

    async fn persist_updates(&self, ctx: &ActorContext<Self>) -> Result<(), MonitorError> {
        Ok(ctx.storage().put(UPDATES_KEY, &self.updates).await?)
    }

    #[instrument(skip_all, fields(account = %ctx.id()))]
    async fn create_healthcheck(
        &mut self,
        ctx: &ActorContext<Self>,
        request: HealthcheckRequest,
    ) -> Result<ActorId, MonitorError> {
        request.validate()?;

        let healthcheck = ctx.env().healthchecks().new_unique();
        let id = healthcheck.id().clone();
        let config = request.into_config(ctx.id().clone());

        self.healthchecks.insert(id.clone(), config.clone());
        self.persist_healthchecks(ctx).await?;

        info!("created health check {id} for {}", config.url);
        healthcheck.configure(config).await
    }

    #[instrument(skip_all, fields(account = %ctx.id(), healthcheck = %id))]
    async fn update_healthcheck(
        &mut self,
        ctx: &ActorContext<Self>,
        id: ActorId,
        request: HealthcheckRequest,
    ) -> Result<ActorId, MonitorError> {
        self.ensure_registered(&id)?;
        request.validate()?;

        let config = request.into_config(ctx.id().clone());
        self.healthchecks.insert(id.clone(), config.clone());
        self.persist_healthchecks(ctx).await?;

        debug!("updated health check");
        ctx.env().healthcheck(id).configure(config).await
    }

    #[instrument(skip_all, fields(account = %ctx.id(), healthcheck = %id))]
    async fn get_healthcheck(
        &self,
        ctx: &ActorContext<Self>,
        id: &ActorId,
    ) -> Result<HealthcheckDetails, MonitorError> {
        self.ensure_registered(id)?;
        ctx.env().healthcheck(id.clone()).details().await
    }

    #[instrument(skip_all, fields(account = %ctx.id(), healthcheck = %id))]
    async fn delete_healthcheck(
        &mut self,
        ctx: &ActorContext<Self>,
        id: ActorId,
    ) -> Result<ActorId, MonitorError> {
        self.ensure_registered(&id)?;

        // Local cleanup only once the health check confirmed
        ctx.env().healthcheck(id.clone()).delete().await?;

        self.healthchecks.remove(&id);
        self.updates.remove(&id);
        self.persist_healthchecks(ctx).await?;
        self.persist_updates(ctx).await?;

        info!("deleted health check");
        Ok(id)
    }

    async fn report_result(
        &mut self,
        ctx: &ActorContext<Self>,
        result: HealthcheckResult,
    ) -> Result<(), MonitorError> {
        trace!(
            "result for {} on account {}: {:?} {}",
            result.id,
            ctx.id(),
            result.health,
            result.code
        );
        self.updates.insert(result.id.clone(), result);
        self.persist_updates(ctx).await
    }
}

impl ActorHandle<AccountActor> {
    pub async fn create_healthcheck(
        &self,
        request: HealthcheckRequest,
    ) -> Result<ActorId, MonitorError> {
        self.ask(|respond_to| AccountCommand::CreateHealthcheck {
            request,
            respond_to,
        })
        .await?
    }

    pub async fn update_healthcheck(
        &self,
        id: ActorId,
        request: HealthcheckRequest,
    ) -> Result<ActorId, MonitorError> {
        self.ask(|respond_to| AccountCommand::UpdateHealthcheck {
            id,
            request,
            respond_to,
        })
        .await?
    }

    pub async fn get_healthcheck(&self, id: ActorId) -> Result<HealthcheckDetails, MonitorError> {
        self.ask(|respond_to| AccountCommand::GetHealthcheck { id, respond_to })
            .await?
    }

    pub async fn delete_healthcheck(&self, id: ActorId) -> Result<ActorId, MonitorError> {
        self.ask(|respond_to| AccountCommand::DeleteHealthcheck { id, respond_to })
            .await?
    }

    /// Mirror a result without waiting; dropped if the mailbox is full
    pub fn report_result(&self, result: HealthcheckResult) -> Result<(), MonitorError> {
        Ok(self.tell(AccountCommand::ReportResult { result })?)
    }

    pub async fn snapshot(&self) -> Result<AccountSnapshot, MonitorError> {
        Ok(self
            .ask(|respond_to| AccountCommand::Snapshot { respond_to })
            .await?)
    }
}
