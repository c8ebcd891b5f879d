//! HealthcheckActor - one probe target, its timer and its history
//!
//! ## Lifecycle
//!
//! ```text
//! Unconfigured ──Configure──► Disabled ◄──Configure──► Scheduled
//!                                 │                       │ alarm: probe → history → report → re-arm
//!                                 └────────Delete─────────┴──► Unconfigured
//! ```
//!
//! The alarm is armed if and only if the stored config is enabled. Results
//! are reported to the owning account with a non-blocking send; a failed
//! report is logged and never stops the timer.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, error, instrument, warn};

use super::error::MonitorError;
use super::messages::HealthcheckCommand;
use crate::cluster::Cluster;
use crate::history::HistoryBuffer;
use crate::runtime::{Actor, ActorContext, ActorHandle, ActorId, RuntimeError};
use crate::{HealthcheckConfig, HealthcheckDetails, HealthcheckResult};

const CONFIG_KEY: &str = "config";
const HISTORY_KEY: &str = "history";

pub struct HealthcheckActor {
    config: Option<HealthcheckConfig>,
    history: HistoryBuffer<HealthcheckResult>,
}

#[async_trait]
impl Actor for HealthcheckActor {
    const KIND: &'static str = "healthcheck";
    type Message = HealthcheckCommand;
    type Env = Cluster;

    async fn load(ctx: &ActorContext<Self>) -> Result<Self, RuntimeError> {
        let storage = ctx.storage();
        Ok(Self {
            config: storage.get(CONFIG_KEY).await?,
            history: storage.get(HISTORY_KEY).await?.unwrap_or_default(),
        })
    }

    async fn handle(&mut self, ctx: &ActorContext<Self>, msg: HealthcheckCommand) {
        match msg {
            HealthcheckCommand::Configure { config, respond_to } => {
                let _ = respond_to.send(self.configure(ctx, config).await);
            }
            HealthcheckCommand::Get { respond_to } => {
                let _ = respond_to.send(HealthcheckDetails {
                    config: self.config.clone(),
                    history: self.history.clone(),
                });
            }
            HealthcheckCommand::Delete { respond_to } => {
                let _ = respond_to.send(self.delete(ctx).await);
            }
            HealthcheckCommand::CheckNow { respond_to } => {
                let result = match self.config.clone() {
                    Some(config) => self.check(ctx, &config).await,
                    None => Err(MonitorError::NotFound(format!("health check {}", ctx.id()))),
                };
                let _ = respond_to.send(result);
            }
        }
    }

    #[instrument(skip_all, fields(healthcheck = %ctx.id()))]
    async fn alarm(&mut self, ctx: &ActorContext<Self>) {
        let Some(config) = self.config.clone().filter(|config| config.enabled) else {
            debug!("alarm fired without an enabled config, ignoring");
            return;
        };

        if let Err(e) = self.check(ctx, &config).await {
            error!("probe cycle failed: {e}");
        }

        if let Err(e) = ctx.set_alarm(next_fire_at(&config)).await {
            error!("failed to re-arm probe timer: {e}");
        }
    }
}

fn next_fire_at(config: &HealthcheckConfig) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::seconds(i64::from(config.period_seconds))
}

/// Arm the timer for an enabled config, disarm it otherwise
async fn apply_timer(
    ctx: &ActorContext<HealthcheckActor>,
    config: &HealthcheckConfig,
) -> Result<(), MonitorError> {
    if config.enabled {
        let fire_at = ctx.set_alarm(next_fire_at(config)).await?;
        debug!("scheduled, next probe at {fire_at}");
    } else {
        ctx.delete_alarm().await?;
        debug!("disabled");
    }
    Ok(())
}

impl HealthcheckActor {
    #[instrument(skip_all, fields(healthcheck = %ctx.id()))]
    async fn configure(
        &mut self,
        ctx: &ActorContext<Self>,
        config: HealthcheckConfig,
    ) -> Result<ActorId, MonitorError> {
        ctx.storage().put(CONFIG_KEY, &config).await?;

        if let Err(e) = apply_timer(ctx, &config).await {
            self.restore_config(ctx).await;
            return Err(e);
        }

        self.config = Some(config);
        Ok(ctx.id().clone())
    }

    /// Put the last applied config back after a failed timer update
    async fn restore_config(&self, ctx: &ActorContext<Self>) {
        let restored = match &self.config {
            Some(previous) => ctx.storage().put(CONFIG_KEY, previous).await,
            // Never configured, so the partition held nothing else
            None => ctx.storage().delete_all().await.map(|_| ()),
        };

        if let Err(e) = restored {
            error!("failed to restore previous config: {e}");
        }
    }

    #[instrument(skip_all, fields(healthcheck = %ctx.id()))]
    async fn delete(&mut self, ctx: &ActorContext<Self>) -> Result<ActorId, MonitorError> {
        let removed = ctx.storage().delete_all().await?;
        ctx.delete_alarm().await?;

        self.config = None;
        self.history.clear();

        debug!("deleted ({removed} keys)");
        Ok(ctx.id().clone())
    }

    /// Probe once, record the result and report it to the account
    async fn check(
        &mut self,
        ctx: &ActorContext<Self>,
        config: &HealthcheckConfig,
    ) -> Result<HealthcheckResult, MonitorError> {
        let outcome = ctx.env().probe().probe(&config.url).await;
        let result = HealthcheckResult::from_outcome(
            ctx.id().clone(),
            config.account_id.clone(),
            outcome,
            Utc::now(),
        );

        self.history.push(result.clone());
        ctx.storage().put(HISTORY_KEY, &self.history).await?;

        let account = ctx.env().account(config.account_id.clone());
        if let Err(e) = account.report_result(result.clone()) {
            warn!("failed to report result to account {}: {e}", config.account_id);
        }

        Ok(result)
    }
}

impl ActorHandle<HealthcheckActor> {
    pub async fn configure(&self, config: HealthcheckConfig) -> Result<ActorId, MonitorError> {
        self.ask(|respond_to| HealthcheckCommand::Configure { config, respond_to })
            .await?
    }

    pub async fn details(&self) -> Result<HealthcheckDetails, MonitorError> {
        Ok(self
            .ask(|respond_to| HealthcheckCommand::Get { respond_to })
            .await?)
    }

    pub async fn delete(&self) -> Result<ActorId, MonitorError> {
        self.ask(|respond_to| HealthcheckCommand::Delete { respond_to })
            .await?
    }

    pub async fn check_now(&self) -> Result<HealthcheckResult, MonitorError> {
        self.ask(|respond_to| HealthcheckCommand::CheckNow { respond_to })
            .await?
    }
}
