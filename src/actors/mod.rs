//! Monitoring actors
//!
//! Two actor kinds run on the durable runtime, both sharing the [`Cluster`]
//! as their environment.
//!
//! ## Architecture Overview
//!
//! ```text
//!            ┌────────────────┐
//!            │  API handlers  │
//!            └───────┬────────┘
//!                    │ existence lookup, then ask
//!            ┌───────▼────────┐
//!            │  AccountActor  │  registry + latest results
//!            └───┬────────▲───┘
//!  Configure/Get │        │ ReportResult (tell)
//!  Delete (ask)  │        │
//!        ┌───────▼────────┴───┐      ┌───────────────┐
//!        │  HealthcheckActor  │─────►│ ProbeExecutor │
//!        └─────────▲──────────┘      └───────────────┘
//!                  │ alarm
//!            ┌─────┴─────┐
//!            │ Scheduler │
//!            └───────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Request/Response**: typed methods on `ActorHandle<_>` wrapping a
//!    oneshot reply channel
//! 2. **Fire-and-forget**: result reports, dropped if the account mailbox is
//!    full
//! 3. **Alarms**: one-shot, re-armed by the health check after each probe
//!
//! [`Cluster`]: crate::cluster::Cluster

pub mod account;
pub mod error;
pub mod healthcheck;
pub mod messages;

pub use account::AccountActor;
pub use error::MonitorError;
pub use healthcheck::HealthcheckActor;
pub use messages::{AccountCommand, HealthcheckCommand};
