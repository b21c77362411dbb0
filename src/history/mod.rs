//! Game history: events, the event log, checkpoints.
//!
//! - `StateChange` / `ChangeEvent`: logged store mutations
//! - `GameEvent`: any logged mutation, task events included
//! - `EventLog`: append-only record with checkpoint queries

pub mod event;
pub mod event_log;

pub use event::{Cause, ChangeEvent, GameEvent, Provenance, StateChange};
pub use event_log::{Checkpoint, EventLog, TaskResult};
