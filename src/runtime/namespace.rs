//! Namespace - activation, routing and passivation of one actor kind
//!
//! A namespace maps ids to live instances. Every instance is one tokio task
//! that owns the receiving half of its mailbox, so messages for one id are
//! handled strictly in arrival order and never concurrently.
//!
//! ## Message Flow
//!
//! ```text
//! ActorHandle::ask/tell → resolve (activate on miss) → mailbox → instance task
//!                                                                  ├─ load() once
//!                                                                  ├─ handle(msg)
//!                                                                  └─ alarm() (fresh firings only)
//! Scheduler → Firing → dispatcher → mailbox (same path as messages)
//! ```
//!
//! An instance that stays idle for the configured timeout is passivated: it
//! is removed from the map and closes its mailbox under the same shard lock,
//! so no new sender can observe it. Envelopes that slipped in before the
//! close are redelivered to the next activation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::join_all;
use tokio::sync::mpsc::error::{SendError, TrySendError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use super::actor::{Actor, ActorContext};
use super::error::RuntimeError;
use super::id::ActorId;
use super::scheduler::{Firing, SchedulerHandle};
use crate::config::RuntimeConfig;
use crate::storage::StorageBackend;

/// Attempts before giving up on a mailbox that keeps closing under us
const MAX_DELIVERY_ATTEMPTS: usize = 5;

/// Tuning knobs of a namespace
#[derive(Debug, Clone)]
pub struct NamespaceSettings {
    /// Bounded capacity of each instance mailbox
    pub mailbox_capacity: usize,

    /// Passivate instances idle for this long; `None` keeps them forever
    pub idle_timeout: Option<Duration>,
}

impl Default for NamespaceSettings {
    fn default() -> Self {
        Self::from(&RuntimeConfig::default())
    }
}

impl From<&RuntimeConfig> for NamespaceSettings {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            mailbox_capacity: config.mailbox_capacity.max(1),
            idle_timeout: config.idle_timeout(),
        }
    }
}

pub(crate) enum Envelope<A: Actor> {
    Message(A::Message),
    Alarm(Firing),
}

struct Mailbox<A: Actor> {
    sender: mpsc::Sender<Envelope<A>>,
    generation: u64,
    task: JoinHandle<()>,
}

struct Inner<A: Actor> {
    instances: DashMap<ActorId, Mailbox<A>>,
    backend: Arc<dyn StorageBackend>,
    scheduler: SchedulerHandle,
    env: Weak<A::Env>,
    settings: NamespaceSettings,
    next_generation: AtomicU64,
    stopped: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

/// All instances of one actor kind
pub struct Namespace<A: Actor> {
    inner: Arc<Inner<A>>,
}

impl<A: Actor> Clone for Namespace<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: Actor> Namespace<A> {
    /// Create a namespace and spawn its scheduler and alarm dispatcher
    ///
    /// `env` is weak so the environment may own its namespaces; it must be
    /// upgradable by the time the first message is delivered.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        env: Weak<A::Env>,
        settings: NamespaceSettings,
    ) -> Self {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);

        let inner = Arc::new(Inner {
            instances: DashMap::new(),
            backend,
            scheduler: SchedulerHandle::spawn(fired_tx),
            env,
            settings,
            next_generation: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            shutdown_tx,
        });

        tokio::spawn(dispatch_alarms(Arc::downgrade(&inner), fired_rx));

        Self { inner }
    }

    /// Address an instance; activation is deferred until the first delivery
    pub fn get(&self, id: ActorId) -> ActorHandle<A> {
        ActorHandle {
            namespace: self.clone(),
            id,
        }
    }

    /// Address a fresh, never used id
    pub fn new_unique(&self) -> ActorHandle<A> {
        self.get(ActorId::new_unique())
    }

    /// Number of currently activated instances
    pub fn live_count(&self) -> usize {
        self.inner.instances.len()
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.inner.backend
    }

    /// Re-arm every persisted alarm of this kind
    ///
    /// Alarms whose time has passed fire immediately.
    #[instrument(skip(self), fields(kind = A::KIND))]
    pub async fn restore_alarms(&self) -> Result<usize, RuntimeError> {
        let alarms = self.inner.backend.list_alarms(A::KIND).await?;
        let mut restored = 0;

        for alarm in alarms {
            let id: ActorId = match alarm.actor_id.parse() {
                Ok(id) => id,
                Err(e) => {
                    warn!("skipping persisted alarm: {e}");
                    continue;
                }
            };
            self.inner.scheduler.arm(id, alarm.fire_at).await?;
            restored += 1;
        }

        info!("restored {restored} {} alarms", A::KIND);
        Ok(restored)
    }

    /// Stop every instance after its current message, and the scheduler
    #[instrument(skip(self), fields(kind = A::KIND))]
    pub async fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.shutdown_tx.send_replace(true);
        self.inner.scheduler.shutdown().await;

        let ids: Vec<ActorId> = self
            .inner
            .instances
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let tasks: Vec<JoinHandle<()>> = ids
            .iter()
            .filter_map(|id| self.inner.instances.remove(id))
            .map(|(_, mailbox)| mailbox.task)
            .collect();

        debug!("waiting for {} {} instances", tasks.len(), A::KIND);
        join_all(tasks).await;
    }

    /// Current mailbox of `id`, activating a new instance on a miss
    fn resolve(&self, id: &ActorId) -> Result<mpsc::Sender<Envelope<A>>, RuntimeError> {
        if self.inner.stopped.load(Ordering::SeqCst) {
            return Err(RuntimeError::Stopped);
        }

        match self.inner.instances.entry(id.clone()) {
            Entry::Occupied(entry) => Ok(entry.get().sender.clone()),
            Entry::Vacant(entry) => {
                let env = self.inner.env.upgrade().ok_or(RuntimeError::Stopped)?;
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = mpsc::channel(self.inner.settings.mailbox_capacity);

                trace!("activating {} {id} (generation {generation})", A::KIND);

                let task = tokio::spawn(run_instance(
                    self.inner.clone(),
                    id.clone(),
                    generation,
                    receiver,
                    env,
                ));

                entry.insert(Mailbox {
                    sender: sender.clone(),
                    generation,
                    task,
                });
                Ok(sender)
            }
        }
    }

    async fn deliver(&self, id: &ActorId, envelope: Envelope<A>) -> Result<(), RuntimeError> {
        let mut envelope = envelope;

        for _ in 0..MAX_DELIVERY_ATTEMPTS {
            let sender = self.resolve(id)?;
            match sender.send(envelope).await {
                Ok(()) => return Ok(()),
                Err(SendError(returned)) => {
                    trace!("{} {id} mailbox closed, re-resolving", A::KIND);
                    envelope = returned;
                }
            }
        }

        Err(RuntimeError::MailboxClosed {
            kind: A::KIND,
            id: id.to_string(),
        })
    }

    fn try_deliver(&self, id: &ActorId, envelope: Envelope<A>) -> Result<(), RuntimeError> {
        let mut envelope = envelope;

        for _ in 0..MAX_DELIVERY_ATTEMPTS {
            let sender = self.resolve(id)?;
            match sender.try_send(envelope) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(_)) => {
                    return Err(RuntimeError::MailboxFull {
                        kind: A::KIND,
                        id: id.to_string(),
                    });
                }
                Err(TrySendError::Closed(returned)) => envelope = returned,
            }
        }

        Err(RuntimeError::MailboxClosed {
            kind: A::KIND,
            id: id.to_string(),
        })
    }
}

/// Address of one actor instance
pub struct ActorHandle<A: Actor> {
    namespace: Namespace<A>,
    id: ActorId,
}

impl<A: Actor> Clone for ActorHandle<A> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            id: self.id.clone(),
        }
    }
}

impl<A: Actor> ActorHandle<A> {
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Deliver a message, waiting for mailbox capacity
    pub async fn send(&self, msg: A::Message) -> Result<(), RuntimeError> {
        self.namespace
            .deliver(&self.id, Envelope::Message(msg))
            .await
    }

    /// Deliver a message without waiting; fails with `MailboxFull` instead
    pub fn tell(&self, msg: A::Message) -> Result<(), RuntimeError> {
        self.namespace.try_deliver(&self.id, Envelope::Message(msg))
    }

    /// Deliver a request and wait for its reply
    pub async fn ask<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> A::Message,
    ) -> Result<R, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx)).await?;

        rx.await.map_err(|_| RuntimeError::NoReply {
            kind: A::KIND,
            id: self.id.to_string(),
        })
    }
}

enum Step<A: Actor> {
    Deliver(Envelope<A>),
    Idle,
    Stop,
}

#[instrument(skip_all, fields(kind = A::KIND, id = %id))]
async fn run_instance<A: Actor>(
    inner: Arc<Inner<A>>,
    id: ActorId,
    generation: u64,
    mut receiver: mpsc::Receiver<Envelope<A>>,
    env: Arc<A::Env>,
) {
    let ctx = ActorContext::<A>::new(
        id.clone(),
        inner.backend.clone(),
        inner.scheduler.clone(),
        env,
    );

    let mut actor = match A::load(&ctx).await {
        Ok(actor) => actor,
        Err(e) => {
            warn!("activation failed: {e}");
            inner
                .instances
                .remove_if(&id, |_, mailbox| mailbox.generation == generation);
            return;
        }
    };

    debug!("activated");

    let mut shutdown_rx = inner.shutdown_tx.subscribe();
    let idle_timeout = inner.settings.idle_timeout;

    loop {
        let step = tokio::select! {
            biased;

            _ = shutdown_rx.wait_for(|stopped| *stopped) => Step::Stop,

            envelope = receiver.recv() => match envelope {
                Some(envelope) => Step::Deliver(envelope),
                None => Step::Stop,
            },

            _ = tokio::time::sleep(idle_timeout.unwrap_or(Duration::MAX)), if idle_timeout.is_some() => Step::Idle,
        };

        match step {
            Step::Deliver(Envelope::Message(msg)) => actor.handle(&ctx, msg).await,
            Step::Deliver(Envelope::Alarm(firing)) => run_alarm(&mut actor, &ctx, firing).await,
            Step::Idle => {
                let passivated = inner
                    .instances
                    .remove_if(&id, |_, mailbox| {
                        if mailbox.generation == generation && receiver.is_empty() {
                            receiver.close();
                            true
                        } else {
                            false
                        }
                    })
                    .is_some();

                if passivated {
                    debug!("passivated after idle timeout");
                    redeliver_leftovers(&inner, &id, &mut receiver);
                    return;
                }
            }
            Step::Stop => break,
        }
    }

    inner
        .instances
        .remove_if(&id, |_, mailbox| mailbox.generation == generation);
    debug!("stopped");
}

/// Run the alarm handler if the firing still matches the persisted alarm
///
/// The persisted alarm stays in place while the handler runs, so a crash
/// mid-handler leaves it to be restored. It is cleared afterwards unless the
/// handler replaced it.
async fn run_alarm<A: Actor>(actor: &mut A, ctx: &ActorContext<A>, firing: Firing) {
    match ctx.storage().get_alarm().await {
        Ok(Some(fire_at)) if fire_at == firing.fire_at => {
            trace!("running alarm scheduled for {fire_at}");
            actor.alarm(ctx).await;
        }
        Ok(_) => {
            trace!("dropping stale alarm firing for {}", firing.fire_at);
            return;
        }
        Err(e) => {
            warn!("failed to read alarm: {e}");
            return;
        }
    }

    match ctx.storage().get_alarm().await {
        Ok(Some(fire_at)) if fire_at == firing.fire_at => {
            if let Err(e) = ctx.storage().delete_alarm().await {
                warn!("failed to clear fired alarm: {e}");
            }
        }
        Ok(_) => {}
        Err(e) => warn!("failed to read alarm after firing: {e}"),
    }
}

/// Hand envelopes that raced with passivation to the next activation
fn redeliver_leftovers<A: Actor>(
    inner: &Arc<Inner<A>>,
    id: &ActorId,
    receiver: &mut mpsc::Receiver<Envelope<A>>,
) {
    let mut leftovers = Vec::new();
    while let Ok(envelope) = receiver.try_recv() {
        leftovers.push(envelope);
    }

    if leftovers.is_empty() {
        return;
    }

    debug!("redelivering {} envelopes", leftovers.len());
    let namespace = Namespace {
        inner: inner.clone(),
    };
    let id = id.clone();

    tokio::spawn(async move {
        for envelope in leftovers {
            if let Err(e) = namespace.deliver(&id, envelope).await {
                warn!("redelivery to {} {id} failed: {e}", A::KIND);
            }
        }
    });
}

#[instrument(skip_all, fields(kind = A::KIND))]
async fn dispatch_alarms<A: Actor>(
    inner: Weak<Inner<A>>,
    mut fired_rx: mpsc::UnboundedReceiver<Firing>,
) {
    while let Some(firing) = fired_rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let namespace = Namespace { inner };

        tokio::spawn(async move {
            let id = firing.id.clone();
            if let Err(e) = namespace.deliver(&id, Envelope::Alarm(firing)).await {
                warn!("failed to deliver alarm to {} {id}: {e}", A::KIND);
            }
        });
    }

    debug!("alarm dispatcher stopped");
}
