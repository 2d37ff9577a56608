//! Background Tasks Module
//!
//! Tasks owned by a cache for its whole lifetime.
//!
//! # Tasks
//! - TTL Janitor: evicts expired entries at the configured interval
//! - Store Writer: executes store actions one at a time, in enqueue order

mod janitor;
mod writer;

pub(crate) use janitor::spawn_janitor_task;
pub use writer::spawn_writer_task;
