//! Execution: prepare, commit, dispatch triggers, repeat for automatic effects.

use tracing::debug;

use crate::core::{Actor, EngineError, Result};
use crate::history::Cause;
use crate::instruction::{Change, Instruction};
use crate::triggers::{FiredEffect, TriggerDispatcher};

use super::committer::{Committer, Dependents};
use super::game::Game;
use super::preparer::Preparer;

impl Game {
    /// Execute `instruction` as `actor`.
    ///
    /// Automatic effects fired along the way run immediately; the others are
    /// returned for the caller to enqueue. Callers wrap this in an atomic
    /// block: on error, partial changes are left for the rollback to undo.
    pub(crate) fn execute(
        &mut self,
        actor: Actor,
        instruction: &Instruction,
        cause: Option<&Cause>,
        depth: usize,
    ) -> Result<Vec<FiredEffect>> {
        if depth > self.config().max_cascade_depth {
            return Err(EngineError::DeadEnd(format!(
                "trigger cascade deeper than {} levels at {instruction}",
                self.config().max_cascade_depth
            )));
        }

        let mut deferred = Vec::new();
        match instruction {
            Instruction::Multi(items) | Instruction::Then(items) => {
                for item in items {
                    deferred.extend(self.execute(actor, item, cause, depth)?);
                }
            }
            Instruction::Gated {
                requirement,
                mandatory,
                inner,
            } if inner.has_parallel_head() => {
                if self.has(requirement) {
                    deferred.extend(self.execute(actor, inner, cause, depth)?);
                } else if *mandatory {
                    return Err(EngineError::Requirement(requirement.to_string()));
                }
            }
            _ => {
                let prepared = Preparer::new(self.reader()).prepare_instruction(instruction)?;
                match prepared {
                    Instruction::NoOp => {}
                    Instruction::Change(change) => {
                        deferred.extend(self.execute_change(actor, &change, cause, depth)?);
                    }
                    Instruction::Custom { name, args } => {
                        let translated = self.customs.translate(&name, &args, self.reader())?;
                        debug!(custom = %name, translated = %translated, "custom instruction translated");
                        deferred.extend(self.execute_translated(actor, translated, cause, depth + 1)?);
                    }
                    composite @ (Instruction::Multi(_) | Instruction::Then(_)) => {
                        deferred.extend(self.execute(actor, &composite, cause, depth)?);
                    }
                    other => {
                        return Err(EngineError::Abstract(format!("{other} needs a choice before it can run")));
                    }
                }
            }
        }
        Ok(deferred)
    }

    /// Run a custom instruction's translation. If it can't run yet, it is
    /// undone and handed back to be queued with the reason attached.
    fn execute_translated(
        &mut self,
        actor: Actor,
        translated: Instruction,
        cause: Option<&Cause>,
        depth: usize,
    ) -> Result<Vec<FiredEffect>> {
        let checkpoint = self.checkpoint();
        match self.execute(actor, &translated, cause, depth) {
            Ok(deferred) => Ok(deferred),
            Err(e) if e.is_not_now() || matches!(e, EngineError::Abstract(_)) => {
                self.rewind(checkpoint);
                debug!(instruction = %translated, reason = %e, "custom translation left pending");
                Ok(vec![FiredEffect {
                    owner: actor,
                    instruction: translated,
                    automatic: false,
                    cause: cause.cloned(),
                    why_pending: Some(e.to_string()),
                }])
            }
            Err(e) => Err(e),
        }
    }

    fn execute_change(
        &mut self,
        actor: Actor,
        change: &Change,
        cause: Option<&Cause>,
        depth: usize,
    ) -> Result<Vec<FiredEffect>> {
        if change.is_abstract(self.types()) {
            return Err(EngineError::Abstract(format!("{change} needs a choice before it can run")));
        }
        let events = Committer::new(&mut self.store, &mut self.log, self.types.as_ref()).commit(
            change,
            actor,
            cause.cloned(),
            Dependents::Remove,
        )?;

        let mut deferred = Vec::new();
        for event in &events {
            let fired = TriggerDispatcher::new(self.reader()).fire(event);
            for effect in fired {
                if effect.automatic {
                    deferred.extend(self.execute(effect.owner, &effect.instruction, effect.cause.as_ref(), depth + 1)?);
                } else {
                    deferred.push(effect);
                }
            }
        }
        Ok(deferred)
    }
}
