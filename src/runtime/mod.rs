//! Durable actor runtime
//!
//! Addressable, single-threaded actor instances with private persistent
//! state and a one-shot durable alarm each. Instances are activated on
//! first delivery, load their state before serving, and are passivated
//! when idle.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  ask/tell   ┌───────────────────────────────┐
//! │ ActorHandle  │────────────►│ Namespace<A>                  │
//! └──────────────┘             │  id → mailbox → instance task │
//!                              │  Scheduler → alarm dispatcher │
//!                              └──────────────┬────────────────┘
//!                                             │ ActorStorage
//!                                             ▼
//!                                     StorageBackend
//! ```

pub mod actor;
pub mod error;
pub mod id;
pub mod namespace;
pub mod scheduler;

pub use actor::{Actor, ActorContext, ActorStorage};
pub use error::RuntimeError;
pub use id::ActorId;
pub use namespace::{ActorHandle, Namespace, NamespaceSettings};
pub use scheduler::{Firing, SchedulerHandle};
