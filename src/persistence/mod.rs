//! Persistence Module
//!
//! Backing store contract and the actions the writer task executes against it.
//!
//! All store traffic of one cache goes through a single writer (see
//! [`crate::tasks::spawn_writer_task`]), which gives a total order of store
//! operations per cache instance.

mod action;
mod memory;
mod store;

pub use action::{Action, ActionKind, ActionResponse, Responder};
pub use memory::MemoryStore;
pub use store::{Store, StoreResult};

/// Capacity of the action queue. Producers wait for the writer once one
/// action is pending.
pub const ACTION_QUEUE_CAPACITY: usize = 1;
