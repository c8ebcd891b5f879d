//! Scheduler - one-shot alarms for actor instances
//!
//! Each namespace owns one scheduler task. The task keeps a min-heap of timer
//! entries keyed by deadline and delivers exactly one [`Firing`] per `arm`
//! call. It never repeats on its own: actors that want recurring work re-arm
//! from their alarm handler.
//!
//! ## Message Flow
//!
//! ```text
//! Arm/Disarm → heap + live entry map → sleep until earliest deadline → Firing → dispatcher → actor mailbox
//! ```
//!
//! Arming an id that already has a pending entry replaces it. Replaced and
//! disarmed entries stay in the heap and are skipped when they surface; the
//! heap is compacted once they outnumber the live entries.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument, trace, warn};

use super::error::RuntimeError;
use super::id::ActorId;

/// Dead heap entries tolerated on top of the live ones before compacting
const COMPACT_SLACK: usize = 64;

/// A delivered alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firing {
    /// Actor the alarm belongs to
    pub id: ActorId,

    /// The wall-clock time the alarm was armed for
    pub fire_at: DateTime<Utc>,
}

/// Commands that can be sent to the scheduler task
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Arm (or re-arm) the alarm of an actor
    Arm { id: ActorId, fire_at: DateTime<Utc> },

    /// Cancel the pending alarm of an actor, if any
    Disarm { id: ActorId },

    /// Number of ids with a pending alarm
    Pending { respond_to: oneshot::Sender<usize> },

    /// Stop the scheduler; pending alarms are dropped
    Shutdown,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct TimerEntry {
    deadline: Instant,
    seq: u64,
    id: ActorId,
    fire_at: DateTime<Utc>,
}

struct SchedulerActor {
    command_rx: mpsc::Receiver<SchedulerCommand>,
    fired_tx: mpsc::UnboundedSender<Firing>,
    queue: BinaryHeap<Reverse<TimerEntry>>,
    /// Sequence number of the live entry for each armed id
    live: HashMap<ActorId, u64>,
    next_seq: u64,
}

impl SchedulerActor {
    #[instrument(skip(self), name = "scheduler")]
    async fn run(mut self) {
        debug!("starting scheduler");

        loop {
            let next_deadline = self.next_deadline();

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::Arm { id, fire_at }) => self.arm(id, fire_at),
                        Some(SchedulerCommand::Disarm { id }) => {
                            if self.live.remove(&id).is_some() {
                                trace!("disarmed alarm for {id}");
                                self.compact_if_sparse();
                            }
                        }
                        Some(SchedulerCommand::Pending { respond_to }) => {
                            let _ = respond_to.send(self.live.len());
                        }
                        Some(SchedulerCommand::Shutdown) | None => break,
                    }
                }

                _ = sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                    self.fire_due();
                }
            }
        }

        debug!("scheduler stopped ({} alarms dropped)", self.live.len());
    }

    fn arm(&mut self, id: ActorId, fire_at: DateTime<Utc>) {
        let delay = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let seq = self.next_seq;
        self.next_seq += 1;

        trace!("arming alarm for {id} in {delay:?}");

        self.live.insert(id.clone(), seq);
        self.queue.push(Reverse(TimerEntry {
            deadline: Instant::now() + delay,
            seq,
            id,
            fire_at,
        }));
        self.compact_if_sparse();
    }

    /// Drop replaced and disarmed entries once they dominate the heap
    fn compact_if_sparse(&mut self) {
        if self.queue.len() <= 2 * self.live.len() + COMPACT_SLACK {
            return;
        }

        let before = self.queue.len();
        let live = &self.live;
        self.queue
            .retain(|Reverse(entry)| live.get(&entry.id) == Some(&entry.seq));
        trace!("compacted timer heap from {before} to {} entries", self.queue.len());
    }

    /// Earliest deadline of a live entry, discarding stale heads
    fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse(entry)) = self.queue.peek() {
            if self.live.get(&entry.id) == Some(&entry.seq) {
                return Some(entry.deadline);
            }
            self.queue.pop();
        }
        None
    }

    fn fire_due(&mut self) {
        let now = Instant::now();

        while let Some(Reverse(entry)) = self.queue.peek() {
            if entry.deadline > now {
                break;
            }
            let Some(Reverse(entry)) = self.queue.pop() else {
                break;
            };

            if self.live.get(&entry.id) != Some(&entry.seq) {
                continue;
            }
            self.live.remove(&entry.id);

            trace!("alarm due for {}", entry.id);
            if self
                .fired_tx
                .send(Firing {
                    id: entry.id,
                    fire_at: entry.fire_at,
                })
                .is_err()
            {
                warn!("alarm dispatcher gone, dropping firing");
            }
        }
    }
}

/// Handle for controlling a scheduler task
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler delivering firings to `fired_tx`
    pub fn spawn(fired_tx: mpsc::UnboundedSender<Firing>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(256);

        let actor = SchedulerActor {
            command_rx: cmd_rx,
            fired_tx,
            queue: BinaryHeap::new(),
            live: HashMap::new(),
            next_seq: 0,
        };

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Arm the alarm of `id`, replacing any pending one
    pub async fn arm(&self, id: ActorId, fire_at: DateTime<Utc>) -> Result<(), RuntimeError> {
        self.sender
            .send(SchedulerCommand::Arm { id, fire_at })
            .await
            .map_err(|_| RuntimeError::SchedulerStopped)
    }

    /// Cancel the pending alarm of `id`
    pub async fn disarm(&self, id: ActorId) -> Result<(), RuntimeError> {
        self.sender
            .send(SchedulerCommand::Disarm { id })
            .await
            .map_err(|_| RuntimeError::SchedulerStopped)
    }

    /// Number of ids with a pending alarm
    pub async fn pending(&self) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::Pending { respond_to: tx })
            .await
            .map_err(|_| RuntimeError::SchedulerStopped)?;

        rx.await.map_err(|_| RuntimeError::SchedulerStopped)
    }

    /// Shut down the scheduler
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SchedulerCommand::Shutdown).await;
    }
}
