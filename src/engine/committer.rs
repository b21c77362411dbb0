//! Committing concrete changes to the store.
//!
//! The committer applies a change, removes dependents that would be left
//! dangling, checks count bounds after every step and logs a `ChangeEvent`
//! per applied step. A failed commit leaves the store and log as they were.

use tracing::{debug, error};

use crate::core::{Actor, EngineError, Result};
use crate::history::{Cause, ChangeEvent, Checkpoint, EventLog, GameEvent, StateChange};
use crate::instruction::{Change, Intensity};
use crate::store::{Component, ComponentStore, Limiter, Reader};
use crate::types::TypeSystem;

/// What to do about components depending on something being removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dependents {
    /// Remove them first.
    Remove,
    /// Refuse the removal.
    Refuse,
}

/// Applies concrete changes to the store.
pub struct Committer<'a> {
    store: &'a mut ComponentStore,
    log: &'a mut EventLog,
    types: &'a dyn TypeSystem,
}

impl<'a> Committer<'a> {
    /// Create a committer over the store and log.
    pub fn new(store: &'a mut ComponentStore, log: &'a mut EventLog, types: &'a dyn TypeSystem) -> Self {
        Self { store, log, types }
    }

    /// Commit a concrete, mandatory change. Returns the logged events in order,
    /// dependent removals first.
    pub fn commit(
        &mut self,
        change: &Change,
        actor: Actor,
        cause: Option<Cause>,
        dependents: Dependents,
    ) -> Result<Vec<ChangeEvent>> {
        let count = match (change.count.fixed(), change.intensity) {
            (Some(count), Intensity::Mandatory) => count,
            _ => return Err(EngineError::Abstract(format!("can't commit {change}: not concrete"))),
        };
        let gaining = change.gaining.clone().map(|g| Component::new(g, self.types)).transpose()?;
        let removing = change.removing.clone().map(|r| Component::new(r, self.types)).transpose()?;

        let start = self.log.checkpoint();
        let mut events = Vec::new();
        let result = self.apply(
            count,
            gaining.as_ref(),
            removing.as_ref(),
            actor,
            cause.as_ref(),
            dependents,
            &mut events,
        );
        match result {
            Ok(()) => Ok(events),
            Err(e) => {
                self.revert(start);
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &mut self,
        count: u32,
        gaining: Option<&Component>,
        removing: Option<&Component>,
        actor: Actor,
        cause: Option<&Cause>,
        dependents: Dependents,
        events: &mut Vec<ChangeEvent>,
    ) -> Result<()> {
        if let Some(removing) = removing {
            if self.store.count_component(removing) <= count {
                for dependent in self.store.dependents_of(removing, self.types) {
                    if dependents == Dependents::Refuse {
                        return Err(EngineError::Dependency(format!(
                            "can't remove {removing}: {dependent} depends on it"
                        )));
                    }
                    let held = self.store.count_component(&dependent);
                    self.apply(held, None, Some(&dependent), actor, cause, dependents, events)
                        .map_err(|e| {
                            EngineError::DeadEnd(format!("removing {dependent} along with {removing}: {e}"))
                        })?;
                }
            }
        }

        if let Some(gaining) = gaining {
            Limiter::new(Reader::new(self.store, self.types)).check_dependencies(gaining)?;
        }
        let change = StateChange {
            count,
            gaining: gaining.map(|c| c.expr().clone()),
            removing: removing.map(|c| c.expr().clone()),
        };
        self.store.apply(count, gaining, removing)?;
        if let Err(e) = Limiter::new(Reader::new(self.store, self.types)).verify(gaining, removing) {
            undo_change(self.store, &change);
            return Err(e);
        }

        let event = self.log.add_change(actor, change, cause.cloned());
        debug!(ordinal = event.ordinal, change = %event.change, actor = %actor, "change committed");
        events.push(event);
        Ok(())
    }

    fn revert(&mut self, checkpoint: Checkpoint) {
        for event in self.log.truncate(checkpoint).iter().rev() {
            if let GameEvent::Change(change) = event {
                undo_change(self.store, &change.change);
            }
        }
    }
}

/// Apply the inverse of a logged change, skipping all checks.
pub(crate) fn undo_change(store: &mut ComponentStore, change: &StateChange) {
    let inverse = change.inverse();
    let gaining = inverse.gaining.map(Component::trusted);
    let removing = inverse.removing.map(Component::trusted);
    if let Err(e) = store.apply(change.count, gaining.as_ref(), removing.as_ref()) {
        error!(change = %change, error = %e, "failed to undo change");
    }
}
