//! Game events.
//!
//! Every mutation of the store or the task queue is recorded as a
//! `GameEvent` with a unique, gap-free ordinal. Events are what rollback
//! replays in reverse.

use serde::{Deserialize, Serialize};

use crate::core::Actor;
use crate::tasks::Task;
use crate::types::TypeExpr;

/// A concrete change to the store: `count` units from `removing` to `gaining`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateChange {
    pub count: u32,
    pub gaining: Option<TypeExpr>,
    pub removing: Option<TypeExpr>,
}

impl StateChange {
    /// The change that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            count: self.count,
            gaining: self.removing.clone(),
            removing: self.gaining.clone(),
        }
    }
}

impl std::fmt::Display for StateChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.gaining, &self.removing) {
            (Some(g), Some(r)) => write!(f, "{} {g} FROM {r}", self.count),
            (Some(g), None) => write!(f, "+{} {g}", self.count),
            (None, Some(r)) => write!(f, "-{} {r}", self.count),
            (None, None) => f.write_str("(nothing)"),
        }
    }
}

/// Why a change or task came about.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cause {
    /// The component whose effect produced it.
    pub context: Option<TypeExpr>,

    /// Ordinal of the change event that fired the effect.
    pub trigger_event: Option<usize>,
}

/// Where a change came from, derived from its cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// Directly requested, no cause recorded.
    Manual,
    /// Fired by a trigger on an earlier event.
    Triggered,
    /// Done on behalf of a component without a triggering event.
    ByCard,
}

/// A change to the store, as logged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub ordinal: usize,
    pub actor: Actor,
    pub change: StateChange,
    pub cause: Option<Cause>,
}

impl ChangeEvent {
    /// Classify where this change came from.
    #[must_use]
    pub fn provenance(&self) -> Provenance {
        match &self.cause {
            None => Provenance::Manual,
            Some(cause) if cause.trigger_event.is_some() => Provenance::Triggered,
            Some(_) => Provenance::ByCard,
        }
    }
}

impl std::fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} by {}", self.ordinal, self.change, self.actor)?;
        if let Some(Cause { context: Some(context), .. }) = &self.cause {
            write!(f, " because {context}")?;
        }
        Ok(())
    }
}

/// Anything recorded in the event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The store changed.
    Change(ChangeEvent),
    /// A task joined the queue.
    TaskAdded { ordinal: usize, task: Task },
    /// A task was replaced by a revised version with the same id.
    TaskEdited { ordinal: usize, old: Task, task: Task },
    /// A task left the queue.
    TaskRemoved { ordinal: usize, task: Task },
}

impl GameEvent {
    /// Position of this event in the log.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        match self {
            GameEvent::Change(event) => event.ordinal,
            GameEvent::TaskAdded { ordinal, .. }
            | GameEvent::TaskEdited { ordinal, .. }
            | GameEvent::TaskRemoved { ordinal, .. } => *ordinal,
        }
    }

    /// The change event, if this is one.
    #[must_use]
    pub fn as_change(&self) -> Option<&ChangeEvent> {
        match self {
            GameEvent::Change(event) => Some(event),
            _ => None,
        }
    }
}
